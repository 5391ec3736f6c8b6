//! Model Integration Tests
//!
//! Builds a small habitat suitability model through the registry, evaluates
//! it with the dependency scheduler and checks the final layers against
//! hand-computed values.

mod tests {
    use approx::assert_relative_eq;
    use eems_fuzzy_rust::{
        Command, CommandSource, DataType, ExecutedNode, FuzzyRange, Grid, Model, ModelFile, NodeError,
        NodeValue, Registry, ResultContext,
    };
    use std::fs;

    fn input(name: &str, values: Vec<f64>, mask: Vec<bool>, data_type: DataType) -> ExecutedNode {
        let n = values.len();
        ExecutedNode::layer(name, Grid::with_mask(1, n, values, mask).unwrap(), data_type)
    }

    /// Slope, distance to water and land cover feeding one suitability layer
    fn habitat_commands(report_path: &str) -> Vec<Command> {
        vec![
            Command::new("FzSlope", "CvtToFuzzy")
                .arg("InFieldName", "Slope")
                .arg("TrueThreshold", 5.0)
                .arg("FalseThreshold", 30.0)
                .at("habitat.eem", 1, "FzSlope = CvtToFuzzy(InFieldName = Slope, ...)"),
            Command::new("FzWater", "CvtToFuzzyCurve")
                .arg("InFieldName", "WaterDist")
                .arg("RawValues", vec![0.0, 500.0, 2000.0])
                .arg("FuzzyValues", vec![1.0, 0.0, -1.0])
                .at("habitat.eem", 2, "FzWater = CvtToFuzzyCurve(...)"),
            Command::new("FzCover", "CvtToFuzzyCat")
                .arg("InFieldName", "LandCover")
                .arg("RawValues", vec![1_i64, 2, 3])
                .arg("FuzzyValues", vec![1.0, 0.2, -1.0])
                .arg("DefaultFuzzyValue", -0.5)
                .at("habitat.eem", 3, "FzCover = CvtToFuzzyCat(...)"),
            Command::new("Terrain", "FuzzyAnd")
                .arg("InFieldNames", vec!["FzSlope", "FzWater"])
                .at("habitat.eem", 4, "Terrain = FuzzyAnd(...)"),
            Command::new("Habitat", "FuzzyWeightedUnion")
                .arg("InFieldNames", vec!["Terrain", "FzCover"])
                .arg("Weights", vec![2.0, 1.0])
                .at("habitat.eem", 5, "Habitat = FuzzyWeightedUnion(...)"),
            Command::new("Suitability", "CvtFromFuzzy")
                .arg("InFieldName", "Habitat")
                .arg("TrueThreshold", 100.0)
                .arg("FalseThreshold", 0.0)
                .at("habitat.eem", 6, "Suitability = CvtFromFuzzy(...)"),
            Command::new("Report", "PrintVars")
                .arg("InFieldNames", vec!["Habitat", "Suitability"])
                .arg("OutFileName", report_path)
                .at("habitat.eem", 7, "Report = PrintVars(...)"),
        ]
    }

    fn habitat_model(report_path: &str) -> Model {
        let mut model = Model::from_commands(&Registry::standard(), habitat_commands(report_path)).unwrap();
        model.add_input(input(
            "Slope",
            vec![2.0, 17.5, 40.0, 10.0],
            vec![false, false, false, true],
            DataType::Float,
        ));
        model.add_input(input(
            "WaterDist",
            vec![0.0, 500.0, 1250.0, 3000.0],
            vec![false; 4],
            DataType::PositiveFloat,
        ));
        model.add_input(input(
            "LandCover",
            vec![1.0, 2.0, 7.0, 3.0],
            vec![false, true, false, false],
            DataType::PositiveInteger,
        ));
        model
    }

    fn result(ctx: &ResultContext, name: &str) -> std::sync::Arc<ExecutedNode> {
        ctx.get(name, &CommandSource::default()).unwrap()
    }

    #[test]
    fn test_habitat_model_values() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let model = habitat_model(report.to_str().unwrap());

        let ctx = ResultContext::new(FuzzyRange::default());
        let summary = model.evaluate(&ctx, false).unwrap();
        assert_eq!(summary.nodes_executed, 7);
        assert_eq!(summary.inputs, 3);

        let slope = result(&ctx, "FzSlope");
        let slope = slope.grid().unwrap();
        assert_relative_eq!(slope.values()[0], 1.0);
        assert_relative_eq!(slope.values()[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(slope.values()[2], -1.0);

        let water = result(&ctx, "FzWater");
        let water = water.grid().unwrap();
        assert_relative_eq!(water.values()[0], 1.0);
        assert_relative_eq!(water.values()[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(water.values()[2], -0.5, epsilon = 1e-12);
        assert_relative_eq!(water.values()[3], -1.0);

        // Category lookup keeps the input mask exactly
        let cover = result(&ctx, "FzCover");
        let cover = cover.grid().unwrap();
        assert_eq!(cover.mask(), &[false, true, false, false]);
        assert_relative_eq!(cover.values()[2], -0.5);
        assert_relative_eq!(cover.values()[3], -1.0);

        // Masks combine through the and/union chain
        let habitat = result(&ctx, "Habitat");
        assert_eq!(habitat.data_type(), DataType::Fuzzy);
        let habitat = habitat.grid().unwrap();
        assert_eq!(habitat.mask(), &[false, true, false, true]);
        assert_relative_eq!(habitat.values()[0], 1.0);
        assert_relative_eq!(habitat.values()[2], -2.5 / 3.0, epsilon = 1e-12);

        let suit = result(&ctx, "Suitability");
        assert_eq!(suit.data_type(), DataType::Float);
        let suit = suit.grid().unwrap();
        assert_relative_eq!(suit.values()[0], 100.0);
        assert_relative_eq!(suit.values()[2], 100.0 / 12.0, epsilon = 1e-9);

        let sink = result(&ctx, "Report");
        assert!(!sink.is_data_layer());
        assert_eq!(sink.result(), &NodeValue::Bool(true));

        let written = fs::read_to_string(&report).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert!(lines[0].starts_with("Habitat: "));
        assert!(written.contains("Suitability: "));
    }

    #[test]
    fn test_fuzzy_outputs_stay_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.txt");
        let model = habitat_model(report.to_str().unwrap());
        let ctx = ResultContext::new(FuzzyRange::default());
        model.evaluate(&ctx, false).unwrap();

        for name in ctx.names() {
            let node = result(&ctx, &name);
            if node.data_type() != DataType::Fuzzy {
                continue;
            }
            for v in node.grid().unwrap().valid_values() {
                assert!((-1.0..=1.0).contains(&v), "{} has {} outside [-1, 1]", name, v);
            }
        }
    }

    #[test]
    fn test_parallel_evaluation_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let seq_report = dir.path().join("seq.txt");
        let par_report = dir.path().join("par.txt");

        let seq_ctx = ResultContext::new(FuzzyRange::default());
        habitat_model(seq_report.to_str().unwrap())
            .evaluate(&seq_ctx, false)
            .unwrap();
        let par_ctx = ResultContext::new(FuzzyRange::default());
        habitat_model(par_report.to_str().unwrap())
            .evaluate(&par_ctx, true)
            .unwrap();

        for name in ["FzSlope", "FzWater", "FzCover", "Terrain", "Habitat", "Suitability"] {
            assert_eq!(result(&seq_ctx, name).as_ref(), result(&par_ctx, name).as_ref());
        }
        assert_eq!(
            fs::read_to_string(&seq_report).unwrap(),
            fs::read_to_string(&par_report).unwrap()
        );
    }

    #[test]
    fn test_node_error_carries_source_location() {
        let mut model = Model::from_commands(
            &Registry::standard(),
            vec![Command::new("Bad", "CvtToFuzzy")
                .arg("InFieldName", "Slope")
                .arg("TrueThreshold", 3.0)
                .arg("FalseThreshold", 3.0)
                .at("broken.eem", 42, "Bad = CvtToFuzzy(InFieldName = Slope, TrueThreshold = 3, FalseThreshold = 3)")],
        )
        .unwrap();
        model.add_input(input("Slope", vec![1.0, 2.0], vec![false; 2], DataType::Float));

        let ctx = ResultContext::new(FuzzyRange::default());
        let err = model.evaluate(&ctx, false).unwrap_err();
        let node_err = err.downcast_ref::<NodeError>().unwrap();
        assert!(matches!(node_err, NodeError::DegenerateThreshold { .. }));
        assert_eq!(node_err.source_loc().file, "broken.eem");
        assert_eq!(node_err.source_loc().line, 42);
        assert!(node_err.to_string().contains("Line number: 42"));
        assert!(!ctx.contains("Bad"));
    }

    #[test]
    fn test_schema_error_at_build_time() {
        let err = Model::from_commands(
            &Registry::standard(),
            vec![Command::new("U", "FuzzyUnion").arg("InFieldNames", vec![1.0, 2.0])],
        )
        .err()
        .unwrap();
        assert!(matches!(
            err.downcast_ref::<NodeError>(),
            Some(NodeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_custom_fuzzy_range() {
        let range = FuzzyRange::new(-2.0, 2.0).unwrap();
        let mut model = Model::from_commands(
            &Registry::standard(),
            vec![
                Command::new("Fz", "CvtToFuzzy")
                    .arg("InFieldName", "X")
                    .arg("TrueThreshold", 10.0)
                    .arg("FalseThreshold", 0.0),
                Command::new("Xor", "FuzzyXOr").arg("InFieldNames", vec!["Fz", "Fz"]),
            ],
        )
        .unwrap();
        model.add_input(input("X", vec![-5.0, 5.0, 20.0], vec![false; 3], DataType::Float));

        let ctx = ResultContext::new(range);
        model.evaluate(&ctx, false).unwrap();

        let fz = result(&ctx, "Fz");
        let fz = fz.grid().unwrap().values();
        assert_relative_eq!(fz[0], -2.0);
        assert_relative_eq!(fz[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(fz[2], 2.0);

        // Two identical inputs: top == second, result is top (or fmin at the floor)
        let xor = result(&ctx, "Xor");
        let xor = xor.grid().unwrap().values();
        assert_relative_eq!(xor[0], -2.0);
        assert_relative_eq!(xor[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(xor[2], 2.0);
    }

    #[test]
    fn test_model_file_roundtrip_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{
                "inputs": [
                    {"name": "Rain", "type": "Positive Float", "rows": [[100.0, 400.0], [700.0, 1000.0]]}
                ],
                "commands": [
                    {"result_name": "FzRain", "operator": "CvtToFuzzy",
                     "args": {"InFieldName": "Rain", "Direction": "LowToHigh"},
                     "source": {"file": "model.json", "line": 1, "raw": "FzRain = CvtToFuzzy(Rain)"}},
                    {"result_name": "Dry", "operator": "FuzzyNot",
                     "args": {"InFieldName": "FzRain"}}
                ]
            }"#,
        )
        .unwrap();

        let model = ModelFile::load(&path).unwrap().into_model(&Registry::standard()).unwrap();
        let ctx = ResultContext::new(FuzzyRange::default());
        model.evaluate(&ctx, true).unwrap();

        let dry = result(&ctx, "Dry");
        let values = dry.grid().unwrap().values();
        assert_relative_eq!(values[0], 1.0);
        assert_relative_eq!(values[3], -1.0);
    }
}
