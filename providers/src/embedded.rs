//! Static tables compiled into the binary. These are the last resort of every
//! chain and the synchronous seed of the state list.

use enrol_types::{DegreeLevel, SourceError};

use crate::{Source, SourceFut};

/// Shown before any directory answers. Never empty.
pub const STATES: &[&str] = &[
    "Andhra Pradesh",
    "Delhi",
    "Gujarat",
    "Karnataka",
    "Maharashtra",
    "Tamil Nadu",
    "Telangana",
    "Uttar Pradesh",
    "West Bengal",
];

/// Major cities per state, in display order.
pub const CITIES: &[(&str, &[&str])] = &[
    (
        "Andhra Pradesh",
        &["Visakhapatnam", "Vijayawada", "Guntur", "Nellore"],
    ),
    ("Arunachal Pradesh", &["Itanagar", "Tawang"]),
    ("Assam", &["Guwahati", "Silchar", "Dibrugarh"]),
    ("Bihar", &["Patna", "Gaya", "Bhagalpur"]),
    ("Chhattisgarh", &["Raipur", "Bhilai"]),
    ("Delhi", &["New Delhi"]),
    ("Goa", &["Panaji", "Margao"]),
    ("Gujarat", &["Ahmedabad", "Surat", "Vadodara", "Rajkot"]),
    ("Haryana", &["Gurugram", "Faridabad"]),
    ("Himachal Pradesh", &["Shimla", "Manali"]),
    ("Jharkhand", &["Ranchi", "Jamshedpur"]),
    ("Karnataka", &["Bengaluru", "Mysuru", "Mangaluru", "Hubballi"]),
    ("Kerala", &["Thiruvananthapuram", "Kochi", "Kozhikode"]),
    ("Madhya Pradesh", &["Bhopal", "Indore", "Gwalior"]),
    ("Maharashtra", &["Mumbai", "Pune", "Nagpur", "Nashik"]),
    ("Manipur", &["Imphal"]),
    ("Meghalaya", &["Shillong"]),
    ("Mizoram", &["Aizawl"]),
    ("Nagaland", &["Kohima", "Dimapur"]),
    ("Odisha", &["Bhubaneswar", "Cuttack"]),
    ("Punjab", &["Amritsar", "Ludhiana", "Jalandhar"]),
    ("Rajasthan", &["Jaipur", "Udaipur", "Jodhpur"]),
    ("Sikkim", &["Gangtok"]),
    ("Tamil Nadu", &["Chennai", "Coimbatore", "Madurai", "Salem"]),
    ("Telangana", &["Hyderabad", "Warangal", "Nizamabad"]),
    ("Tripura", &["Agartala"]),
    ("Uttar Pradesh", &["Lucknow", "Kanpur", "Noida", "Varanasi"]),
    ("Uttarakhand", &["Dehradun", "Haridwar"]),
    ("West Bengal", &["Kolkata", "Siliguri", "Durgapur"]),
];

pub const UG_DEGREES: &[&str] = &[
    "B.Tech Computer Science",
    "B.Tech Electronics",
    "B.Tech Mechanical",
    "B.Sc Computer Science",
    "BBA",
    "B.Com",
];

pub const PG_DEGREES: &[&str] = &[
    "M.Tech Computer Science",
    "M.Tech Data Science",
    "MBA",
    "MCA",
];

/// Cities for a state, matched exactly as the table spells it.
#[must_use]
pub fn cities_for(state: &str) -> &'static [&'static str] {
    for (name, cities) in CITIES {
        if *name == state {
            return *cities;
        }
    }
    &[]
}

#[must_use]
pub fn degrees_for(level: DegreeLevel) -> &'static [&'static str] {
    match level {
        DegreeLevel::Undergraduate => UG_DEGREES,
        DegreeLevel::Postgraduate => PG_DEGREES,
    }
}

/// Graduation years from `current` down to `floor`, inclusive.
#[must_use]
pub fn years(current: i32, floor: i32) -> Vec<i32> {
    (floor..=current).rev().collect()
}

/// Last-resort city source backed by [`CITIES`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCities;

impl Source<str> for StaticCities {
    fn name(&self) -> &'static str {
        "embedded-cities"
    }

    fn is_embedded(&self) -> bool {
        true
    }

    fn query<'a>(&'a self, state: &'a str) -> SourceFut<'a, Vec<String>> {
        let cities = cities_for(state.trim());
        Box::pin(async move {
            if cities.is_empty() {
                Err(SourceError::Empty)
            } else {
                Ok(cities.iter().map(ToString::to_string).collect())
            }
        })
    }
}

/// Last-resort degree catalog backed by [`UG_DEGREES`] and [`PG_DEGREES`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDegrees;

impl Source<DegreeLevel> for StaticDegrees {
    fn name(&self) -> &'static str {
        "embedded-degrees"
    }

    fn is_embedded(&self) -> bool {
        true
    }

    fn query<'a>(&'a self, level: &'a DegreeLevel) -> SourceFut<'a, Vec<String>> {
        let degrees = degrees_for(*level);
        Box::pin(async move { Ok(degrees.iter().map(ToString::to_string).collect()) })
    }
}
