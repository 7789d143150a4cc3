//! Domain models mapped from backend records

pub mod calculation;
pub mod goal;
pub mod identity;
pub mod meal_plan;
pub mod measurement;
pub mod workout;

pub use calculation::Calculation;
pub use goal::{Goal, GoalStatus};
pub use identity::Identity;
pub use meal_plan::{Macros, Meal, MealDay, MealItem, MealPlan, MealType};
pub use measurement::Measurement;
pub use workout::{Exercise, Workout};
