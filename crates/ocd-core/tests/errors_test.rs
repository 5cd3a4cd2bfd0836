use ocd_core::errors::*;

#[test]
fn sizing_error_carries_counts() {
    let err = SizingError::TooManyEpisodes {
        requested: 7,
        available: 5,
    };
    let msg = err.to_string();
    assert!(msg.contains('7'));
    assert!(msg.contains('5'));
}

#[test]
fn unknown_key_lists_known_keys() {
    let err = ConfigError::UnknownKey {
        registry: "activation".into(),
        key: "swishy".into(),
        known: "relu, tanh".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("swishy"));
    assert!(msg.contains("relu, tanh"));
}

#[test]
fn unsupported_stage_names_the_stage() {
    let err = OcdError::UnsupportedStage {
        stage: "test".into(),
    };
    assert!(err.to_string().contains("test"));
}

// --- From impls ---

#[test]
fn config_error_converts_to_ocd_error() {
    let err: OcdError = ConfigError::NoPositiveBatchSize.into();
    assert!(matches!(err, OcdError::ConfigError(_)));
}

#[test]
fn sizing_error_converts_to_ocd_error() {
    let err: OcdError = SizingError::ValidationTooLarge {
        dataset: "observational".into(),
        val_size: 20,
        len: 10,
    }
    .into();
    assert!(matches!(err, OcdError::SizingError(_)));
}

#[test]
fn shape_error_converts_to_ocd_error() {
    let err: OcdError = ShapeError::NotSquare { rows: 2, cols: 3 }.into();
    assert!(matches!(err, OcdError::ShapeError(_)));
    assert!(err.to_string().contains("2x3"));
}

#[test]
fn graph_error_converts_to_ocd_error() {
    let err: OcdError = GraphError::CycleDetected {
        path: "0 -> 1 -> 0".into(),
    }
    .into();
    assert!(matches!(err, OcdError::GraphError(_)));
}
