use crate::db::measurement_repo::MeasurementValueRow;
use crate::db::new_id;
use crate::extraction::{MeasurementSection, Measurements};

/// One row per `(section, key)` of every mapping section, in blob order.
/// Non-mapping sections produce nothing.
pub fn flatten_measurements(
    measurements: &Measurements,
    measurement_id: &str,
    unit: &str,
) -> Vec<MeasurementValueRow> {
    let mut rows = Vec::new();
    for (garment, section) in measurements.sections() {
        let fields = match section {
            MeasurementSection::Fields(fields) => fields,
            MeasurementSection::Scalar(_) => continue,
        };
        for (key, leaf) in fields {
            rows.push(MeasurementValueRow {
                id: new_id(),
                measurement_id: measurement_id.to_string(),
                garment: garment.clone(),
                key: key.clone(),
                value: leaf.coerce(),
                unit: unit.to_string(),
            });
        }
    }
    rows
}
