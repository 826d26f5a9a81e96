#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::series::ScalarSeries;

    fn energy() -> ScalarSeries {
        let mut s = ScalarSeries::new();
        s.push(0, -2.0);
        s.push(10, -2.5);
        s.push(20, -1.0);
        s
    }

    #[test]
    fn log_axes_drop_non_positive_points() {
        let spec = PlotSpec::new("accuracy", "eps", "rel error")
            .log_axes(true, true)
            .with_series(PlotSeries::new("tot", vec![(0.1, 1e-3), (0.0, 1e-2), (0.01, -1.0), (0.001, 1e-5)]));
        let layout = layout(&spec).unwrap();
        assert_eq!(layout.series[0].len(), 2);
        assert!((layout.series[0][0].0 - (-1.0)).abs() < 1e-12);
        assert!((layout.series[0][1].1 - (-5.0)).abs() < 1e-12);
    }

    #[test]
    fn reference_line_is_inside_the_bounds() {
        let spec = PlotSpec::new("energy", "timestep", "E")
            .with_series(PlotSeries::from_series("E(t)", &energy()))
            .with_reference_line("E0", 5.0);
        let layout = layout(&spec).unwrap();
        assert_eq!(layout.reference_y, Some(5.0));
        assert!(layout.bounds.y_max > 5.0);
        assert!(layout.bounds.y_min < -2.5);
    }

    #[test]
    fn nothing_plottable_is_an_error() {
        let spec = PlotSpec::new("empty", "x", "y")
            .log_axes(false, true)
            .with_series(PlotSeries::new("neg", vec![(1.0, -1.0), (2.0, f64::NAN)]));
        assert!(matches!(layout(&spec), Err(VizError::EmptyResult { .. })));
    }

    #[test]
    fn dashes_cover_every_other_piece() {
        let dashes = dash_path(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)], 4);
        assert_eq!(dashes.len(), 4);
        assert_eq!(dashes[0], vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(dashes[1], vec![(2.0, 0.0), (3.0, 0.0)]);
        assert_eq!(dashes[3], vec![(4.0, 2.0), (4.0, 3.0)]);
    }

    #[test]
    fn csv_and_tsv_exports() {
        let csv = render_series(&energy(), "Total energy", ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("# Series Export\n# Title: Total energy\n"));
        assert!(csv.contains("\ntimestep,value\n0,-2\n10,-2.5\n20,-1\n"));

        let tsv = render_series(&energy(), "Total energy", ExportFormat::Tsv).unwrap();
        assert!(tsv.contains("timestep\tvalue\n10\t-2.5\n"));
    }

    #[test]
    fn json_export_round_trips_points() {
        let json = render_series(&energy(), "Total energy", ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Total energy");
        assert_eq!(value["points"][1]["timestep"], 10);
        assert_eq!(value["points"][1]["value"], -2.5);
        assert_eq!(value["initial"], -2.0);
    }

    #[test]
    fn export_and_draw_write_files() {
        let dir = std::env::temp_dir().join(format!("nbody_viz_plot_{}", std::process::id()));
        let csv = dir.join("energy.csv");
        export_series(&energy(), "Total energy", ExportFormat::Csv, &csv).unwrap();
        assert!(std::fs::read_to_string(&csv).unwrap().contains("20,-1"));

        let png = dir.join("energy.png");
        let config = crate::config::PlotConfig {
            width_px: 120,
            height_px: 80,
            draw_labels: false,
        };
        let spec = PlotSpec::new("energy", "timestep", "E")
            .with_series(PlotSeries::from_series("E(t)", &energy()).with_markers())
            .with_series(PlotSeries::new("guide", vec![(0.0, -2.0), (20.0, -1.5)]).dashed())
            .with_reference_line("E0", -2.0);
        draw_plot(&spec, &png, &config).unwrap();
        assert!(std::fs::metadata(&png).unwrap().len() > 0);
        let _ = std::fs::remove_dir_all(&dir);
    }
    fn error_grid() -> crate::parser::TabularData {
        let text = "# x y log10_rel_error\n\
                    -1 -1 -3.0\n-1 0 -4.0\n-1 1 -5.0\n\
                    0 -1 -2.0\n0 0 -inf\n0 1 -6.0\n\
                    1 -1 -3.5\n1 0 -4.5\n1 1 -5.5\n";
        crate::parser::TabularData::read(std::io::Cursor::new(text)).unwrap()
    }

    #[test]
    fn heat_map_cells_tile_the_grid() {
        let map = HeatMap::from_table(&error_grid(), "x", "y", "log10_rel_error").unwrap();
        assert_eq!(map.len(), 9);
        assert_eq!(map.cell_size(), (1.0, 1.0));
        assert_eq!(map.value_range(), Some((-6.0, -2.0)));
        let bounds = map.bounds().unwrap();
        assert_eq!((bounds.x_min, bounds.x_max), (-1.5, 1.5));
        assert_eq!((bounds.y_min, bounds.y_max), (-1.5, 1.5));
        assert_eq!(map.normalized(-6.0), Some(0.0));
        assert_eq!(map.normalized(-4.0), Some(0.5));
        assert_eq!(map.normalized(f64::NEG_INFINITY), None);
    }

    #[test]
    fn heat_map_needs_known_columns_and_cells() {
        assert!(matches!(
            HeatMap::from_table(&error_grid(), "x", "y", "error"),
            Err(VizError::UnknownColumn { .. })
        ));
        assert!(matches!(HeatMap::from_cells(Vec::new()), Err(VizError::EmptyResult { .. })));

        let single = HeatMap::from_cells(vec![HeatCell { x: 2.0, y: 3.0, value: 1.0 }]).unwrap();
        assert_eq!(single.cell_size(), (crate::config::DEGENERATE_SPAN, crate::config::DEGENERATE_SPAN));
        assert_eq!(single.normalized(1.0), Some(0.5));
    }

    #[test]
    fn heat_map_draws_a_png() {
        let dir = std::env::temp_dir().join(format!("nbody_viz_heat_{}", std::process::id()));
        let png = dir.join("spatial_error_map.png");
        let config = crate::config::PlotConfig {
            width_px: 90,
            height_px: 90,
            draw_labels: false,
        };
        let map = HeatMap::from_table(&error_grid(), "x", "y", "log10_rel_error").unwrap();
        draw_heatmap(&map, "error", &png, &config).unwrap();
        assert!(std::fs::metadata(&png).unwrap().len() > 0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
