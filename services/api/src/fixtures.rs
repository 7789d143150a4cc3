//! Demo student data, served while no record store is configured

use serde_json::json;

use common::gateway::Record;

use crate::repositories::Category;

/// Student id of the demo identity
pub const DEMO_STUDENT_ID: &str = "demo123";

/// Raw demo rows of `category`, shaped like backend records
pub fn records(category: Category) -> Vec<Record> {
    match category {
        Category::Goals => goals(),
        Category::Measurements => measurements(),
        Category::Calculations => calculations(),
        Category::Workouts => workouts(),
        Category::MealPlans => meal_plans(),
    }
}

fn goals() -> Vec<Record> {
    vec![
        Record::new(
            "goal-1",
            json!({
                "Description": "Perdre 5kg",
                "Valeur Cible": 78,
                "TargetDate": "2023-12-31",
                "Status": "in-progress"
            }),
        ),
        Record::new(
            "goal-2",
            json!({
                "Description": "Courir un semi-marathon",
                "TargetDate": "2024-03-15",
                "Status": "pending"
            }),
        ),
    ]
}

fn measurements() -> Vec<Record> {
    [
        ("2023-10-01", 83.0, 18.0, 40.0),
        ("2023-11-01", 81.5, 17.5, 41.0),
        ("2023-12-01", 80.0, 16.8, 42.0),
    ]
    .iter()
    .enumerate()
    .map(|(i, (date, weight, body_fat, muscle))| {
        Record::new(
            format!("measurement-{}", i + 1),
            json!({
                "Date de Mesure": date,
                "Poids": weight,
                "Taille": 182,
                "Masse Grasse (%)": body_fat,
                "Masse Musculaire": muscle,
                "Poids Initial": 83,
                "Poids Cible": 78
            }),
        )
    })
    .collect()
}

fn calculations() -> Vec<Record> {
    vec![Record::new(
        "calculation-1",
        json!({
            "Date": "2023-12-01",
            "BMR": 1800,
            "BCJ": 2400,
            "Protéines (g)": 160,
            "Glucides (g)": 240,
            "Lipides (g)": 80
        }),
    )]
}

fn workouts() -> Vec<Record> {
    let rows = [
        ("2023-12-04", "Lundi", "A", "Jambes", "Squat", "4x10", "90s", Some("Augmenter le poids progressivement")),
        ("2023-12-04", "Lundi", "A", "Jambes", "Presse à cuisse", "3x12", "60s", None),
        ("2023-12-04", "Lundi", "A", "Jambes", "Extension des jambes", "3x15", "60s", None),
        ("2023-12-04", "Mercredi", "B", "Haut du corps", "Développé couché", "4x8", "90s", None),
        ("2023-12-04", "Mercredi", "B", "Haut du corps", "Élévations latérales", "3x12", "60s", None),
        ("2023-12-04", "Mercredi", "B", "Haut du corps", "Dips", "3x10", "60s", None),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, (week, day, block, part, exercise, format, rest, notes))| {
            Record::new(
                format!("workout-{}", i + 1),
                json!({
                    "Semaine": week,
                    "Jour": day,
                    "Bloc": block,
                    "Partie": part,
                    "Exercice": exercise,
                    "Format de Travail": format,
                    "Rest": rest,
                    "Notes": notes
                }),
            )
        })
        .collect()
}

fn meal_plans() -> Vec<Record> {
    vec![Record::new(
        "meal-plan-1",
        json!({
            "Date": "2023-12-05",
            "Name": "Plan de la semaine",
            "Meals": [
                {
                    "Type": "breakfast",
                    "Jour": "Lundi",
                    "Items": [
                        {"Name": "Flocons d'avoine", "Quantity": "80g", "Calories": 300, "Protein": 10, "Carbs": 50, "Fat": 5},
                        {"Name": "Protéine whey", "Quantity": "30g", "Calories": 120, "Protein": 24, "Carbs": 3, "Fat": 1}
                    ]
                },
                {
                    "Type": "lunch",
                    "Jour": "Lundi",
                    "Items": [
                        {"Name": "Poulet grillé", "Quantity": "150g", "Calories": 250, "Protein": 45, "Carbs": 0, "Fat": 8},
                        {"Name": "Riz complet", "Quantity": "100g", "Calories": 130, "Protein": 3, "Carbs": 28, "Fat": 1},
                        {"Name": "Légumes variés", "Quantity": "150g", "Calories": 80, "Protein": 3, "Carbs": 15, "Fat": 0}
                    ]
                }
            ]
        }),
    )]
}
