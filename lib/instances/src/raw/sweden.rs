//! The 41 Swedish cities of the Autonomax study.
use super::autonomax::{CityTable, Coord, Demand};

/// `(name, (latitude, longitude), population in thousands)`
pub const CITIES: [(&str, Coord, Demand); 41] = [
  ("Boden", (65.833333, 21.666667), 28.0),
  ("Borås", (57.7210839, 12.9407407), 113.0),
  ("Eskilstuna", (59.3717379, 16.5051474), 106.0),
  ("Falun", (60.6070068, 15.6323059), 59.0),
  ("Gävle", (60.6750132, 17.1467019), 102.0),
  ("Göteborg", (57.7072326, 11.9670171), 587.0),
  ("Halmstad", (56.6739826, 12.8574827), 103.0),
  ("Haparanda", (65.833333, 24.1), 10.0),
  ("Helsingborg", (56.0441984, 12.7040684), 149.0),
  ("Hudiksvall", (61.7281607, 17.105575), 37.0),
  ("Jönköping", (57.7825634, 14.165719), 142.0),
  ("Kalmar", (57.02784235, 16.575243899947836), 70.0),
  ("Karlskrona", (56.1621073, 15.5866422), 66.0),
  ("Karlstad", (59.3809146, 13.5027631), 94.0),
  ("Kiruna", (67.8550724, 20.2255482), 23.0),
  ("Kristianstad", (56.0293778, 14.1566859), 86.0),
  ("Lidköping", (58.5037196, 13.1576427), 40.0),
  ("Linköping", (58.4098135, 15.6245252), 164.0),
  ("Luleå", (65.5831187, 22.1459535), 79.0),
  ("Malmö", (55.6052931, 13.0001566), 351.0),
  ("Motala", (58.5420395, 15.041261), 44.0),
  ("Norrköping", (58.5909124, 16.1903511), 143.0),
  ("Nyköping", (58.7545409, 17.0120656), 57.0),
  ("Sandviken", (60.619422, 16.7724214), 39.0),
  ("Skellefteå", (64.7520185, 20.959339), 74.0),
  ("Skövde", (58.3898453, 13.8443792), 56.0),
  ("Stockholm", (59.3251172, 18.0710935), 975.0),
  ("Sundsvall", (62.3907552, 17.3071024), 99.0),
  ("Trelleborg", (55.37592, 13.1461522), 46.0),
  ("Uddevalla", (58.3490555, 11.9382855), 57.0),
  ("Umeå", (63.8256568, 20.2630745), 130.0),
  ("Uppsala", (59.8586126, 17.6387436), 233.0),
  ("Varberg", (57.1057412, 12.2502949), 66.0),
  ("Vetlanda", (57.36554305, 15.167830505066155), 27.0),
  ("Vänersborg", (58.3811988, 12.3226877), 40.0),
  ("Västervik", (57.7594186, 16.6385035), 36.0),
  ("Västerås", (59.6110992, 16.5463679), 155.0),
  ("Växjö", (56.8787183, 14.8094385), 94.0),
  ("Örebro", (59.2747287, 15.2151181), 156.0),
  ("Örnsköldsvik", (63.2888613, 18.7160209), 56.0),
  ("Östersund", (63.1793655, 14.6357061), 64.0),
];

pub const SCENARIO_NAMES: [&str; 3] = ["uniform", "population", "metropolitan"];

const METROPOLITAN: [&str; 3] = ["Stockholm", "Göteborg", "Malmö"];
const METROPOLITAN_WEIGHT: Demand = 3.0;

pub fn city_table() -> CityTable {
  let names = CITIES.iter().map(|c| c.0.to_string()).collect();
  let coords = CITIES.iter().map(|c| c.1).collect();
  let uniform = vec![1.0; CITIES.len()];
  let population: Vec<_> = CITIES.iter().map(|c| c.2).collect();
  let metropolitan = CITIES.iter()
    .map(|&(name, _, pop)| if METROPOLITAN.contains(&name) { pop * METROPOLITAN_WEIGHT } else { pop })
    .collect();

  CityTable {
    names,
    coords,
    scenario_names: SCENARIO_NAMES.iter().map(|s| s.to_string()).collect(),
    demand: vec![uniform, population, metropolitan],
  }
}
