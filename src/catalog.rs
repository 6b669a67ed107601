use crate::models::{Category, LocationRecord};

macro_rules! poi {
    ($name:expr, $lat:expr, $lng:expr, $country:expr, $category:ident) => {
        LocationRecord {
            name: $name,
            lat: $lat,
            lng: $lng,
            country: $country,
            category: Category::$category,
        }
    };
}

pub const LOCATIONS: &[LocationRecord] = &[
    poi!("Amsterdam Cafe", 52.38419, 4.86842, "Netherlands", Restaurant),
    poi!("Amsterdam Fine Dining", 52.38023, 4.89194, "Netherlands", Restaurant),
    poi!("Hotel Berlin Gendarmenmarkt", 52.51098, 13.39156, "Germany", Hotel),
    poi!("Hilton Berlin", 52.51240, 13.39279, "Germany", Hotel),
    poi!("Pizza Florida", 41.89485, 12.47674, "Italy", Restaurant),
    poi!("Otivm Hotel", 41.89502, 12.48030, "Italy", Hotel),
    poi!("La Taberna Sanlúcar", 40.41483, -3.70804, "Spain", Restaurant),
    poi!("Hotel Diaa Plus", 40.36636, -3.65418, "Spain", Hotel),
    poi!("Kunsthistorisches Museum Wien", 48.20389, 16.36177, "Austria", Museum),
    poi!("Geboortehuis van Mozart", 47.80012, 13.04354, "Austria", Museum),
    poi!("Takumi Ramen Kitchen", 50.84689, 4.35232, "Belgium", Restaurant),
    poi!("El Pulgarcito", 50.83371, 4.34765, "Belgium", Restaurant),
    poi!("Rocco Forte Hotel Amigo", 50.84639, 4.35194, "Belgium", Hotel),
    poi!("Magritte Museum", 50.84250, 4.35806, "Belgium", Museum),
    poi!("Rijksmuseum", 52.35998, 4.88521, "Netherlands", Museum),
    poi!("Musée du Louvre", 48.86061, 2.33764, "France", Museum),
    poi!("Le Meurice", 48.86515, 2.32807, "France", Hotel),
    poi!("Time Out Market Lisboa", 38.70695, -9.14590, "Portugal", Restaurant),
    poi!("Museo del Prado", 40.41378, -3.69214, "Spain", Museum),
    poi!("Hotel Sacher Wien", 48.20388, 16.36906, "Austria", Hotel),
];

/// Immutable view over the catalog records.
#[derive(Debug, Clone, Copy)]
pub struct LocationCatalog {
    records: &'static [LocationRecord],
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self::new(LOCATIONS)
    }
}

impl LocationCatalog {
    pub const fn new(records: &'static [LocationRecord]) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &'static [LocationRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct countries in first-seen order, for the country dropdown.
    pub fn countries(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for record in self.records {
            if !seen.contains(&record.country) {
                seen.push(record.country);
            }
        }
        seen
    }

    /// Distinct category names in first-seen order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for record in self.records {
            let name = record.category.as_str();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}
