use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

pub const MAX_WEEKLY_DISTANCE: u32 = 500;

macro_rules! lifestyle_choice {
    ($name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

lifestyle_choice!(CommuteMethod {
    PetrolCar => "Gas/Petrol Car",
    DieselCar => "Diesel Car",
    HybridCar => "Hybrid Car",
    Ev => "EV",
    Motorcycle => "Motorcycle",
    PublicTransit => "Public Transit",
    BicycleWalking => "Bicycle/Walking",
});

lifestyle_choice!(AirTravel {
    NoFlights => "None",
    ShortFlights => "1-2 Short Flights",
    SeveralFlights => "3-5 Flights",
    FrequentFlyer => "Frequent Flyer (6+ flights)",
    LongHaul => "Long-Haul International",
});

lifestyle_choice!(DietType {
    HeavyMeat => "Heavy Meat Eater (Daily)",
    Average => "Average (Meat 3-4x/week)",
    Pescatarian => "Pescatarian",
    Vegetarian => "Vegetarian",
    Vegan => "Vegan",
});

lifestyle_choice!(FoodSourcing {
    Supermarket => "Mostly Supermarket (Imported)",
    Mixed => "Mix of Supermarket & Local",
    Local => "Mostly Local/Farmers Market",
});

lifestyle_choice!(HomeType {
    Apartment => "Apartment (1-2 beds)",
    MediumHouse => "Medium House (3 beds)",
    LargeHouse => "Large House (4+ beds)",
});

lifestyle_choice!(EnergySource {
    StandardGrid => "Standard Grid (Fossil Heavy)",
    MixedGrid => "Mixed Grid",
    Renewable => "100% Renewable Tariff / Solar",
});

lifestyle_choice!(ClothingHabit {
    FastFashion => "Frequent Fast Fashion",
    Mainstream => "Occasional Mainstream Brands",
    SecondHand => "Mostly Second-hand/Thrift",
    Sustainable => "Sustainable Brands Only",
});

lifestyle_choice!(TechReplacement {
    Yearly => "Upgrade yearly",
    EveryFewYears => "Upgrade every 2-3 years",
    UntilBroken => "Use until broken",
});

/// Answers from the eco-profile questionnaire.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifestyleProfile {
    pub commute: CommuteMethod,
    pub weekly_distance: u32,
    pub flights: AirTravel,
    pub diet: DietType,
    pub food_sourcing: FoodSourcing,
    pub home: HomeType,
    pub heavy_hvac: bool,
    pub energy_source: EnergySource,
    pub clothing: ClothingHabit,
    pub tech: TechReplacement,
}

impl Default for LifestyleProfile {
    fn default() -> Self {
        Self {
            commute: CommuteMethod::PetrolCar,
            weekly_distance: 100,
            flights: AirTravel::NoFlights,
            diet: DietType::HeavyMeat,
            food_sourcing: FoodSourcing::Supermarket,
            home: HomeType::Apartment,
            heavy_hvac: true,
            energy_source: EnergySource::StandardGrid,
            clothing: ClothingHabit::FastFashion,
            tech: TechReplacement::Yearly,
        }
    }
}

impl LifestyleProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.weekly_distance > MAX_WEEKLY_DISTANCE {
            return Err(ValidationError::OutOfRange {
                field: "weekly_distance",
                value: self.weekly_distance as f64,
                min: 0.0,
                max: MAX_WEEKLY_DISTANCE as f64,
            });
        }
        Ok(())
    }

    pub fn transport_line(&self) -> String {
        format!(
            "Method: {}, Distance: {}/wk, Flights: {}",
            self.commute, self.weekly_distance, self.flights
        )
    }

    pub fn diet_line(&self) -> String {
        format!("Type: {}, Sourcing: {}", self.diet, self.food_sourcing)
    }

    pub fn energy_line(&self) -> String {
        format!(
            "Home: {}, Heavy HVAC: {}, Source: {}",
            self.home,
            if self.heavy_hvac { "yes" } else { "no" },
            self.energy_source
        )
    }

    pub fn shopping_line(&self) -> String {
        format!("Fashion: {}, Tech: {}", self.clothing, self.tech)
    }
}
