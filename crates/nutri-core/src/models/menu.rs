//! Suggested daily menu.

use serde::{Deserialize, Serialize};

use super::null_as_default;

pub const DEFAULT_MEAL_OPTION: &str = "Sin restricciones";
pub const DEFAULT_MEAL_DESCRIPTION: &str = "Opciones disponibles para esta comida.";

/// The five fixed meal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meal {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

impl Meal {
    /// Slots in serving order.
    pub const ALL: [Meal; 5] = [
        Meal::Breakfast,
        Meal::MorningSnack,
        Meal::Lunch,
        Meal::AfternoonSnack,
        Meal::Dinner,
    ];

    /// Stored field name.
    pub fn field_name(&self) -> &'static str {
        match self {
            Meal::Breakfast => "desayuno",
            Meal::MorningSnack => "refrigerioMatutino",
            Meal::Lunch => "almuerzo",
            Meal::AfternoonSnack => "merienda",
            Meal::Dinner => "cena",
        }
    }
}

/// Options and guidance for one meal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MealSlot {
    #[serde(rename = "opciones", default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl MealSlot {
    /// Placeholder a doctor starts from when no menu exists.
    pub fn suggested() -> Self {
        Self {
            options: vec![DEFAULT_MEAL_OPTION.to_string()],
            description: DEFAULT_MEAL_DESCRIPTION.to_string(),
        }
    }
}

/// A patient's daily menu. Replaced wholesale on every save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Menu {
    #[serde(rename = "desayuno", default, deserialize_with = "null_as_default")]
    pub breakfast: MealSlot,
    #[serde(rename = "refrigerioMatutino", default, deserialize_with = "null_as_default")]
    pub morning_snack: MealSlot,
    #[serde(rename = "almuerzo", default, deserialize_with = "null_as_default")]
    pub lunch: MealSlot,
    #[serde(rename = "merienda", default, deserialize_with = "null_as_default")]
    pub afternoon_snack: MealSlot,
    #[serde(rename = "cena", default, deserialize_with = "null_as_default")]
    pub dinner: MealSlot,
}

impl Menu {
    /// Every slot set to the placeholder suggestion.
    pub fn suggested() -> Self {
        Self {
            breakfast: MealSlot::suggested(),
            morning_snack: MealSlot::suggested(),
            lunch: MealSlot::suggested(),
            afternoon_snack: MealSlot::suggested(),
            dinner: MealSlot::suggested(),
        }
    }

    pub fn slot(&self, meal: Meal) -> &MealSlot {
        match meal {
            Meal::Breakfast => &self.breakfast,
            Meal::MorningSnack => &self.morning_snack,
            Meal::Lunch => &self.lunch,
            Meal::AfternoonSnack => &self.afternoon_snack,
            Meal::Dinner => &self.dinner,
        }
    }

    pub fn slot_mut(&mut self, meal: Meal) -> &mut MealSlot {
        match meal {
            Meal::Breakfast => &mut self.breakfast,
            Meal::MorningSnack => &mut self.morning_snack,
            Meal::Lunch => &mut self.lunch,
            Meal::AfternoonSnack => &mut self.afternoon_snack,
            Meal::Dinner => &mut self.dinner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_suggested_menu() {
        let menu = Menu::suggested();
        for meal in Meal::ALL {
            assert_eq!(menu.slot(meal).options, vec![DEFAULT_MEAL_OPTION.to_string()]);
        }
    }

    #[test]
    fn test_wire_names() {
        let mut menu = Menu::suggested();
        menu.slot_mut(Meal::Lunch).options = vec!["Pollo".into(), "Ensalada".into()];

        let value = serde_json::to_value(&menu).unwrap();
        for meal in Meal::ALL {
            assert!(value.get(meal.field_name()).is_some());
        }
        assert_eq!(value["almuerzo"]["opciones"], json!(["Pollo", "Ensalada"]));
    }

    #[test]
    fn test_partial_menu_defaults() {
        let menu: Menu = serde_json::from_value(json!({
            "cena": {"opciones": ["Sopa"], "descripcion": "Liviano"}
        }))
        .unwrap();
        assert_eq!(menu.dinner.description, "Liviano");
        assert!(menu.breakfast.options.is_empty());
    }

    #[test]
    fn test_null_slots_default() {
        let menu: Menu = serde_json::from_value(json!({
            "desayuno": null,
            "almuerzo": {"opciones": null, "descripcion": null},
            "cena": {"opciones": ["Sopa"]}
        }))
        .unwrap();
        assert_eq!(menu.breakfast, MealSlot::default());
        assert!(menu.lunch.options.is_empty());
        assert_eq!(menu.dinner.options, vec!["Sopa".to_string()]);
    }
}
