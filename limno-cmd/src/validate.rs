use limno_data::{merge::reindex_nearest, resolve::NearestPolicy, LabelledArray};
use limno_sources::json_store::load_json;
use limno_utils::metrics::compute_rmse;
use log::info;
use std::path::Path;

/// RMSE of a model series against measurements snapped onto its axis.
///
/// Both arrays must be one-dimensional over an axis of the same name.
pub fn model_rmse(model: &LabelledArray, measured: &LabelledArray, policy: NearestPolicy) -> anyhow::Result<f64> {
    let [axis] = model.axes() else {
        anyhow::bail!("'{}' is not a one-dimensional series", model.name);
    };
    let snapped = reindex_nearest(measured, axis, policy)?;
    Ok(compute_rmse(model.values(), snapped.values()))
}

pub fn run_validate(model: &Path, measured: &Path, unbounded: bool) -> anyhow::Result<()> {
    let model: LabelledArray = load_json(model)?;
    let measured: LabelledArray = load_json(measured)?;
    let policy = if unbounded {
        NearestPolicy::Unbounded
    } else {
        NearestPolicy::Extrapolated
    };
    let rmse = model_rmse(&model, &measured, policy)?;
    info!("Compared {} model samples of '{}'", model.values().len(), model.name);
    println!("RMSE: {}", rmse);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use limno_data::axis::Axis;
    use limno_sources::json_store::save_json;

    fn series(times: &[f64], values: &[f64]) -> LabelledArray {
        LabelledArray::new("temperature", vec![Axis::time_from_epoch(times.to_vec())], values.to_vec()).unwrap()
    }

    #[test]
    fn test_model_rmse_snaps_measurements() {
        let model = series(&[0.0, 600.0], &[10.0, 12.0]);
        // measurements at a finer step, nearest ones are 11.0 and 12.0
        let measured = series(&[0.0, 300.0, 590.0], &[11.0, 20.0, 12.0]);
        let rmse = model_rmse(&model, &measured, NearestPolicy::Extrapolated).unwrap();
        assert_eq!(rmse, 0.5_f64.sqrt());
    }

    #[test]
    fn test_model_rmse_rejects_grids() {
        let grid = LabelledArray::from_rows(
            "temperature",
            Axis::depth(vec![0.0, 1.0]),
            Axis::time_from_epoch(vec![0.0]),
            &[vec![1.0], vec![2.0]],
        )
        .unwrap();
        assert!(model_rmse(&grid, &series(&[0.0], &[1.0]), NearestPolicy::Unbounded).is_err());
    }

    #[test]
    fn test_run_validate_reads_saved_series() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        let measured = dir.path().join("measured.json");
        save_json(&series(&[0.0], &[4.0]), &model).unwrap();
        save_json(&series(&[0.0], &[5.0]), &measured).unwrap();
        run_validate(&model, &measured, false).unwrap();
    }
}
