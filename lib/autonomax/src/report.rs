//! Rendering of solved models: a text table, JSON records, a JSON summary and GeoJSON.
use std::io::Write;
use std::str::FromStr;
use anyhow::Result;
use itertools::Itertools;
use json::{self, JsonValue};

use crate::solution::{CityInfo, EdgeInfo, SolvedModel};

pub const OUTPUT_FORMAT_STRINGS: [&str; 4] = ["table", "json", "json-summ", "geojson"];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonSummary,
    GeoJson,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "json-summ" => Ok(Self::JsonSummary),
            "geojson" => Ok(Self::GeoJson),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

impl Default for OutputFormat {
    fn default() -> Self { OutputFormat::Table }
}

pub trait Report {
    fn write_table(&self, buf: impl Write) -> Result<()>;
    fn write_json(&self, buf: impl Write) -> Result<()>;
    fn write_json_summary(&self, buf: impl Write) -> Result<()>;
    fn write_geojson(&self, buf: impl Write) -> Result<()>;

    fn write(&self, buf: impl Write, output: OutputFormat) -> Result<()> {
        match output {
            OutputFormat::Table => self.write_table(buf)?,
            OutputFormat::Json => self.write_json(buf)?,
            OutputFormat::JsonSummary => self.write_json_summary(buf)?,
            OutputFormat::GeoJson => self.write_geojson(buf)?,
        };
        Ok(())
    }
}

fn edge_record(e: &EdgeInfo, names: &[String]) -> JsonValue {
    json::object! {
        from: names[e.from].as_str(),
        to: names[e.to].as_str(),
        "type": e.kind.as_str(),
        flow: e.flow,
        cost: e.cost,
        distance: e.distance,
        utilization: e.utilization,
    }
}

fn city_record(c: &CityInfo) -> JsonValue {
    json::object! {
        index: c.index,
        name: c.name.as_str(),
        is_core_city: c.is_core_city,
        is_control_center: c.is_control_center,
        demand: c.demand,
        ingoing_flow: c.ingoing_flow,
        outgoing_flow: c.outgoing_flow,
    }
}

/// One line summarising a run: configuration, status, objective and model size.
pub fn summary_record(solved: &SolvedModel) -> JsonValue {
    let model = &solved.model;
    let mut record = json::object! {
        instance: model.data.id.as_str(),
        cities: model.data.n_cities(),
        core_cities: model.config.core_city_count,
        cycle: model.config.core_net_is_cycle,
        status: solved.status().as_str(),
        objective: solved.objective(),
        num_vars: model.program.num_vars(),
        num_int_vars: model.program.num_int_vars(),
        num_constrs: model.program.num_constrs(),
    };
    if let Some(sol) = solved.solution() {
        record["control_center"] = sol.control_center().map(|c| model.data.names[c].as_str()).into();
        record["core_edges"] = sol.core_edges().len().into();
        record["sub_edges"] = sol.edge_info().iter().filter(|e| e.kind == crate::solution::EdgeKind::Sub).count().into();
        record["route"] = match sol.core_route() {
            Ok(route) => route.iter().map(|&c| model.data.names[c].as_str()).collect_vec().into(),
            Err(_) => JsonValue::Null,
        };
    }
    record
}

impl<'a> Report for SolvedModel<'a> {
    fn write_table(&self, mut buf: impl Write) -> Result<()> {
        let names = &self.model.data.names;
        writeln!(buf, "instance: {}  cities: {}  NC: {}  Z: {}",
                 self.model.data.id, self.model.data.n_cities(),
                 self.model.config.core_city_count, self.model.config.z())?;
        write!(buf, "status: {}", self.status())?;
        if let Some(obj) = self.objective() {
            write!(buf, "  objective: {:.3}", obj)?;
        }
        writeln!(buf)?;

        let sol = match self.solution() {
            Some(sol) => sol,
            None => return Ok(()),
        };

        if let Ok(route) = sol.core_route() {
            writeln!(buf, "core route: {}", route.iter().map(|&c| names[c].as_str()).join(" - "))?;
        }
        writeln!(buf)?;
        writeln!(buf, "{:<16} {:<16} {:<5} {:>10} {:>12} {:>10} {:>6}", "From", "To", "Type", "Flow", "Cost", "Distance", "Util")?;
        for e in sol.edge_info() {
            writeln!(buf, "{:<16} {:<16} {:<5} {:>10.2} {:>12.2} {:>10.1} {:>6.3}",
                     names[e.from], names[e.to], e.kind.as_str(), e.flow, e.cost, e.distance, e.utilization)?;
        }
        writeln!(buf)?;
        writeln!(buf, "{:>3} {:<16} {:>5} {:>3} {:>10} {:>10} {:>10}", "#", "City", "Core", "CC", "Demand", "In", "Out")?;
        for c in sol.city_info() {
            let mark = |b: bool| if b { "x" } else { "" };
            writeln!(buf, "{:>3} {:<16} {:>5} {:>3} {:>10.2} {:>10.2} {:>10.2}",
                     c.index, c.name, mark(c.is_core_city), mark(c.is_control_center),
                     c.demand, c.ingoing_flow, c.outgoing_flow)?;
        }
        Ok(())
    }

    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let names = &self.model.data.names;
        let mut root = summary_record(self);
        let (edges, cities): (JsonValue, JsonValue) = match self.solution() {
            Some(sol) => (
                sol.edge_info().iter().map(|e| edge_record(e, names)).collect_vec().into(),
                sol.city_info().iter().map(city_record).collect_vec().into(),
            ),
            None => (JsonValue::new_array(), JsonValue::new_array()),
        };
        root["edges"] = edges;
        root["cities"] = cities;
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        summary_record(self).write_pretty(&mut buf, 2)?;
        Ok(())
    }

    fn write_geojson(&self, mut buf: impl Write) -> Result<()> {
        let data = self.model.data;
        let point = |i: usize| -> JsonValue {
            let (lat, lon) = data.coords[i];
            json::array![lon, lat]
        };
        let mut features = Vec::new();
        if let Some(sol) = self.solution() {
            for c in sol.city_info() {
                let geometry = json::object! { "type": "Point", coordinates: point(c.index) };
                features.push(json::object! {
                    "type": "Feature",
                    geometry: geometry,
                    properties: city_record(&c),
                });
            }
            for e in sol.edge_info() {
                let geometry = json::object! {
                    "type": "LineString",
                    coordinates: json::array![point(e.from), point(e.to)],
                };
                features.push(json::object! {
                    "type": "Feature",
                    geometry: geometry,
                    properties: edge_record(&e, &data.names),
                });
            }
        }
        let root = json::object! {
            "type": "FeatureCollection",
            features: features,
        };
        root.write_pretty(&mut buf, 2)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build, small_instance, Config};
    use crate::solver::Microlp;

    fn render(solved: &SolvedModel, fmt: OutputFormat) -> String {
        let mut buf = Vec::new();
        solved.write(&mut buf, fmt).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parse_format() {
        for s in OUTPUT_FORMAT_STRINGS.iter() {
            assert!(s.parse::<OutputFormat>().is_ok());
        }
        assert_eq!("geojson".parse::<OutputFormat>(), Ok(OutputFormat::GeoJson));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn render_solved() -> Result<()> {
        let data = small_instance(3);
        let solved = build(&data, Config::new(2, false)).solve(&Microlp)?;

        let summary = json::parse(&render(&solved, OutputFormat::JsonSummary))?;
        assert_eq!(summary["status"], "optimal");
        assert_eq!(summary["core_cities"], 2);
        assert_eq!(summary["core_edges"], 1);
        assert_eq!(summary["route"].len(), 2);
        assert!(summary["objective"].as_f64().is_some());

        let full = json::parse(&render(&solved, OutputFormat::Json))?;
        assert_eq!(full["cities"].len(), 3);
        assert!(full["edges"].members().any(|e| e["type"] == "CORE"));

        let geo = json::parse(&render(&solved, OutputFormat::GeoJson))?;
        assert_eq!(geo["type"], "FeatureCollection");
        let points = geo["features"].members().filter(|f| f["geometry"]["type"] == "Point").count();
        assert_eq!(points, 3);
        let (lat, lon) = data.coords[0];
        assert_eq!(geo["features"][0]["geometry"]["coordinates"][0].as_f64(), Some(lon));
        assert_eq!(geo["features"][0]["geometry"]["coordinates"][1].as_f64(), Some(lat));

        let table = render(&solved, OutputFormat::Table);
        assert!(table.contains("status: optimal"));
        assert!(table.contains("CORE"));
        assert!(table.contains(&data.names[2]));
        Ok(())
    }

    #[test]
    fn render_infeasible() -> Result<()> {
        let data = small_instance(3);
        let solved = build(&data, Config::new(0, true)).solve(&Microlp)?;
        let summary = json::parse(&render(&solved, OutputFormat::JsonSummary))?;
        assert_eq!(summary["status"], "infeasible");
        assert!(summary["objective"].is_null());
        assert!(!summary.has_key("route"));

        let full = json::parse(&render(&solved, OutputFormat::Json))?;
        assert!(full["edges"].is_empty());

        let table = render(&solved, OutputFormat::Table);
        assert_eq!(table.lines().count(), 2);
        Ok(())
    }
}
