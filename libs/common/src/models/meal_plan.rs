//! Meal plan model with derived nutrition totals

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{Add, AddAssign};

use crate::fields;
use crate::gateway::Record;

const DATE_FIELDS: &[&str] = &["Date", "Semaine"];
const NAME_FIELDS: &[&str] = &["Name", "Nom"];
const MEALS_FIELDS: &[&str] = &["Meals", "Repas"];
const MEAL_TYPE_FIELDS: &[&str] = &["Type", "Repas"];
const MEAL_DAY_FIELDS: &[&str] = &["Jour", "Day"];
const ITEMS_FIELDS: &[&str] = &["Items", "Aliments"];
const ITEM_NAME_FIELDS: &[&str] = &["Name", "Aliment", "Nom"];
const ITEM_QUANTITY_FIELDS: &[&str] = &["Quantity", "Quantité"];
const ITEM_CALORIES_FIELDS: &[&str] = &["Calories", "Kcal"];
const ITEM_PROTEIN_FIELDS: &[&str] = &["Protein", "Protéines"];
const ITEM_CARBS_FIELDS: &[&str] = &["Carbs", "Glucides"];
const ITEM_FAT_FIELDS: &[&str] = &["Fat", "Lipides"];

/// Day labels in week order, with their accepted spellings
const WEEK_DAYS: [(&str, &[&str]); 7] = [
    ("Lundi", &["lundi", "monday"]),
    ("Mardi", &["mardi", "tuesday"]),
    ("Mercredi", &["mercredi", "wednesday"]),
    ("Jeudi", &["jeudi", "thursday"]),
    ("Vendredi", &["vendredi", "friday"]),
    ("Samedi", &["samedi", "saturday"]),
    ("Dimanche", &["dimanche", "sunday"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" | "petit-déjeuner" | "petit déjeuner" | "petit-dejeuner" => {
                Some(MealType::Breakfast)
            }
            "lunch" | "déjeuner" | "dejeuner" => Some(MealType::Lunch),
            "snack" | "collation" | "goûter" | "gouter" => Some(MealType::Snack),
            "dinner" | "dîner" | "diner" => Some(MealType::Dinner),
            _ => None,
        }
    }
}

/// Energy and macronutrients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, other: Macros) -> Macros {
        Macros {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, other: Macros) {
        *self = *self + other;
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Macros {
        iter.fold(Macros::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub name: String,
    pub quantity: Option<String>,
    #[serde(flatten)]
    pub macros: Macros,
}

impl MealItem {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            name: fields::text(fields, ITEM_NAME_FIELDS).unwrap_or_default(),
            quantity: fields::text(fields, ITEM_QUANTITY_FIELDS),
            macros: Macros {
                calories: fields::number(fields, ITEM_CALORIES_FIELDS).unwrap_or(0.0),
                protein: fields::number(fields, ITEM_PROTEIN_FIELDS).unwrap_or(0.0),
                carbs: fields::number(fields, ITEM_CARBS_FIELDS).unwrap_or(0.0),
                fat: fields::number(fields, ITEM_FAT_FIELDS).unwrap_or(0.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: Option<MealType>,
    /// Day-of-week label as stored
    pub day: Option<String>,
    pub items: Vec<MealItem>,
}

impl Meal {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            meal_type: fields::text(fields, MEAL_TYPE_FIELDS).and_then(|t| MealType::parse(&t)),
            day: fields::text(fields, MEAL_DAY_FIELDS),
            items: nested_objects(fields, ITEMS_FIELDS)
                .map(MealItem::from_fields)
                .collect(),
        }
    }

    pub fn totals(&self) -> Macros {
        self.items.iter().map(|item| item.macros).sum()
    }
}

/// Meals of one day, in meal order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealDay<'a> {
    pub day: String,
    pub meals: Vec<&'a Meal>,
    pub totals: Macros,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub name: String,
    pub meals: Vec<Meal>,
}

impl MealPlan {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date(DATE_FIELDS),
            name: record
                .text(NAME_FIELDS)
                .unwrap_or_else(|| "Plan alimentaire".to_string()),
            meals: nested_objects(&record.fields, MEALS_FIELDS)
                .map(Meal::from_fields)
                .collect(),
        }
    }

    /// Meals grouped by day, Monday to Sunday, unknown labels after in
    /// first-seen order
    pub fn days(&self) -> Vec<MealDay<'_>> {
        let mut days: Vec<(usize, MealDay<'_>)> = Vec::new();

        for meal in &self.meals {
            let label = meal.day.clone().unwrap_or_default();
            let (rank, canonical) = day_rank(&label);
            match days.iter_mut().find(|(_, d)| d.day == canonical) {
                Some((_, day)) => day.meals.push(meal),
                None => days.push((
                    rank,
                    MealDay {
                        day: canonical,
                        meals: vec![meal],
                        totals: Macros::default(),
                    },
                )),
            }
        }

        days.sort_by_key(|(rank, _)| *rank);
        days.into_iter()
            .map(|(_, mut day)| {
                day.meals
                    .sort_by_key(|meal| (meal.meal_type.is_none(), meal.meal_type));
                day.totals = day.meals.iter().map(|meal| meal.totals()).sum();
                day
            })
            .collect()
    }

    pub fn weekly_totals(&self) -> Macros {
        self.meals.iter().map(Meal::totals).sum()
    }
}

/// Position of a day label in the week, unknown labels rank after Sunday
fn day_rank(label: &str) -> (usize, String) {
    let normalized = label.trim().to_lowercase();
    WEEK_DAYS
        .iter()
        .position(|(_, spellings)| spellings.contains(&normalized.as_str()))
        .map(|i| (i, WEEK_DAYS[i].0.to_string()))
        .unwrap_or_else(|| (WEEK_DAYS.len(), label.trim().to_string()))
}

fn nested_objects<'a>(
    fields: &'a Map<String, Value>,
    candidates: &[&str],
) -> impl Iterator<Item = &'a Map<String, Value>> {
    fields::first_present(fields, candidates)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
