//! Build prediction request bodies from raw rows.
//!
//! [`RequestSettings`] captures the `ANTINEX_*` request-shaping variables once;
//! [`generate_ai_request`] filters and converts rows and overlays the settings on
//! a request template, producing a body ready for [`crate::AiClient::run_job`].

use crate::types::{is_falsy, Response, Status};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

pub const DEFAULT_REQUEST_FILE: &str =
    "/opt/antinex-client/examples/predict-rows-scaler-full-django.json";
pub const DEFAULT_MODEL_NAME: &str = "Full-Django-AntiNex-Simple-Scaler-DNN";
pub const DEFAULT_PREDICT_FEATURE: &str = "label_value";
pub const DEFAULT_MISSING_VALUE: &str = "-1.0";

/// Target type of row value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertType {
    Float,
    Int,
    /// Unrecognized type name. Columns are not assigned during conversion, so
    /// filter features end up holding the missing value.
    Unsupported,
}

impl ConvertType {
    pub fn parse(name: &str) -> Self {
        match name {
            "float" => ConvertType::Float,
            "int" => ConvertType::Int,
            _ => ConvertType::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConvertType::Float => "float",
            ConvertType::Int => "int",
            ConvertType::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    pub publish_enabled: bool,
    pub request_file: PathBuf,
    pub features_to_process: Vec<String>,
    pub ignore_features: Vec<String>,
    pub sort_values: Vec<String>,
    pub metrics: Vec<String>,
    pub histories: Vec<String>,
    pub ml_type: String,
    pub model_name: String,
    pub predict_feature: String,
    pub seed: i64,
    pub test_size: f64,
    pub batch_size: i64,
    pub epochs: i64,
    pub num_splits: i64,
    pub loss: String,
    pub optimizer: String,
    pub convert_enabled: bool,
    pub convert_to: ConvertType,
    pub include_failed_conversions: bool,
    pub missing_value: String,
    pub publish_to_core: bool,
    pub check_missing_predict: bool,
    pub debug: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            publish_enabled: true,
            request_file: PathBuf::from(DEFAULT_REQUEST_FILE),
            features_to_process: Vec::new(),
            ignore_features: Vec::new(),
            sort_values: Vec::new(),
            metrics: Vec::new(),
            histories: Vec::new(),
            ml_type: "classification".to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            predict_feature: DEFAULT_PREDICT_FEATURE.to_string(),
            seed: 42,
            test_size: 0.2,
            batch_size: 32,
            epochs: 15,
            num_splits: 3,
            loss: "binary_crossentropy".to_string(),
            optimizer: "adam".to_string(),
            convert_enabled: true,
            convert_to: ConvertType::Float,
            include_failed_conversions: false,
            missing_value: DEFAULT_MISSING_VALUE.to_string(),
            publish_to_core: true,
            check_missing_predict: true,
            debug: false,
        }
    }
}

impl RequestSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the `ANTINEX_*` request variables returned by `lookup`.
    ///
    /// Flags are on only when set to `1`. Numbers that fail to parse keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let flag = |key: &str, default: bool| match lookup(key) {
            Some(v) => v == "1",
            None => default,
        };
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let list = |key: &str| lookup(key).map(|v| split_list(&v)).unwrap_or_default();

        Self {
            publish_enabled: flag("ANTINEX_PUBLISH_ENABLED", d.publish_enabled),
            request_file: lookup("ANTINEX_PUBLISH_REQUEST_FILE")
                .map(PathBuf::from)
                .unwrap_or(d.request_file),
            features_to_process: list("ANTINEX_FEATURES_TO_PROCESS"),
            ignore_features: list("ANTINEX_IGNORE_FEATURES"),
            sort_values: list("ANTINEX_SORT_VALUES"),
            metrics: list("ANTINEX_METRICS"),
            histories: list("ANTINEX_HISTORIES"),
            ml_type: text("ANTINEX_ML_TYPE", &d.ml_type),
            model_name: text("ANTINEX_USE_MODEL_NAME", &d.model_name),
            predict_feature: text("ANTINEX_PREDICT_FEATURE", &d.predict_feature),
            seed: parsed(lookup("ANTINEX_SEED"), d.seed),
            test_size: parsed(lookup("ANTINEX_TEST_SIZE"), d.test_size),
            batch_size: parsed(lookup("ANTINEX_BATCH_SIZE"), d.batch_size),
            epochs: parsed(lookup("ANTINEX_EPOCHS"), d.epochs),
            num_splits: parsed(lookup("ANTINEX_NUM_SPLITS"), d.num_splits),
            loss: text("ANTINEX_LOSS", &d.loss),
            optimizer: text("ANTINEX_OPTIMIZER", &d.optimizer),
            convert_enabled: flag("ANTINEX_CONVERT_DATA", d.convert_enabled),
            convert_to: lookup("ANTINEX_CONVERT_DATA_TYPE")
                .map(|v| ConvertType::parse(&v))
                .unwrap_or(d.convert_to),
            include_failed_conversions: flag(
                "ANTINEX_INCLUDE_FAILED_CONVERSIONS",
                d.include_failed_conversions,
            ),
            missing_value: text("ANTINEX_MISSING_VALUE", &d.missing_value),
            publish_to_core: flag("ANTINEX_PUBLISH_TO_CORE", d.publish_to_core),
            check_missing_predict: flag("ANTINEX_CHECK_MISSING_PREDICT", d.check_missing_predict),
            debug: flag("ANTINEX_CLIENT_DEBUG", d.debug),
        }
    }

    /// Features kept in predict rows: features to process minus the predict
    /// feature and the ignored features, in their original order.
    pub fn filter_features(&self) -> Vec<String> {
        let ignored: HashSet<&str> = self.ignore_features.iter().map(String::as_str).collect();
        self.features_to_process
            .iter()
            .filter(|f| **f != self.predict_feature && !ignored.contains(f.as_str()))
            .cloned()
            .collect()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

fn parsed<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Convert one row value. `None` means the conversion failed or `to` is unsupported.
fn convert(value: &Value, to: ConvertType) -> Option<Value> {
    match to {
        ConvertType::Unsupported => None,
        ConvertType::Float => {
            let f = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            }?;
            Number::from_f64(f).map(Value::Number)
        }
        ConvertType::Int => {
            let i = match value {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                Value::Bool(b) => Some(i64::from(*b)),
                _ => None,
            }?;
            Some(Value::from(i))
        }
    }
}

/// Build a prediction request body.
///
/// `template` is used when present and non-empty; otherwise the body is read
/// from `settings.request_file`. Failures are reported through the envelope:
/// `Disabled` when publishing is off, `Failed` for missing rows or template,
/// `Error` for an unreadable template or malformed rows.
pub fn generate_ai_request(
    predict_rows: &[Value],
    template: Option<&Value>,
    settings: &RequestSettings,
) -> Response {
    if !settings.publish_enabled {
        info!("publish disabled ANTINEX_PUBLISH_ENABLED=0");
        return Response::new(Status::Disabled, "disabled", None);
    }

    if predict_rows.is_empty() {
        let err = "please provide a list of predict_rows";
        error!("{}", err);
        return Response::failed(err);
    }

    let body = match template.filter(|t| !is_falsy(t)) {
        Some(t) => Some(t.clone()),
        None => match load_template(settings) {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "failed loading request template");
                return Response::error(err);
            }
        },
    };

    let mut body = match body.filter(|b| !is_falsy(b)) {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let err = format!("request body is not a JSON object body={}", other);
            error!("{}", err);
            return Response::error(err);
        }
        None => {
            let err = format!(
                "failed to load request body req_dict={} req_file={}",
                template.map(Value::to_string).unwrap_or_else(|| "None".into()),
                settings.request_file.display()
            );
            error!("{}", err);
            return Response::failed(err);
        }
    };

    let filter_features = settings.filter_features();
    if settings.debug {
        info!(
            rows = predict_rows.len(),
            features = ?filter_features,
            "setting values"
        );
    }

    let mut rows = Vec::with_capacity(predict_rows.len());
    for (idx, row) in predict_rows.iter().enumerate() {
        match shape_row(row, &filter_features, settings) {
            Some(shaped) => rows.push(Value::Object(shaped)),
            None => {
                let err = format!("predict row {} is not an object row={}", idx, row);
                error!("{}", err);
                return Response::error(err);
            }
        }
    }
    info!(rows = predict_rows.len(), use_rows = rows.len(), "converted rows");

    body.insert("label".into(), settings.model_name.clone().into());
    body.insert("predict_feature".into(), settings.predict_feature.clone().into());
    body.insert("predict_rows".into(), Value::Array(rows));
    body.insert("publish_to_core".into(), settings.publish_to_core.into());
    body.insert("seed".into(), settings.seed.into());
    body.insert("test_size".into(), settings.test_size.into());
    body.insert("batch_size".into(), settings.batch_size.into());
    body.insert("epochs".into(), settings.epochs.into());
    body.insert("num_splits".into(), settings.num_splits.into());
    body.insert("loss".into(), settings.loss.clone().into());
    body.insert("optimizer".into(), settings.optimizer.clone().into());
    body.insert("metrics".into(), settings.metrics.clone().into());
    body.insert("histories".into(), settings.histories.clone().into());
    body.insert("ml_type".into(), settings.ml_type.clone().into());
    if !settings.sort_values.is_empty() {
        body.insert("sort_values".into(), settings.sort_values.clone().into());
    }
    if !filter_features.is_empty() {
        body.insert("features_to_process".into(), filter_features.into());
    }
    if !settings.ignore_features.is_empty() {
        body.insert("ignore_features".into(), settings.ignore_features.clone().into());
    }

    Response::success(Value::Object(body))
}

/// `Ok(None)` when the request file does not exist.
fn load_template(settings: &RequestSettings) -> std::result::Result<Option<Value>, String> {
    let path = &settings.request_file;
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed reading req_file={} ex={}", path.display(), e))?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| format!("failed parsing req_file={} ex={}", path.display(), e))
}

/// Keep filter-feature columns, replace falsy values with the missing value
/// and convert them. Absent columns are filled with the missing value as
/// configured, unconverted. `None` if the row is not an object.
fn shape_row(
    row: &Value,
    filter_features: &[String],
    settings: &RequestSettings,
) -> Option<Map<String, Value>> {
    let row = row.as_object()?;
    let missing = Value::String(settings.missing_value.clone());
    let mut shaped = Map::new();

    for (col, value) in row {
        if !filter_features.iter().any(|f| f == col) {
            continue;
        }
        let value = if is_falsy(value) { &missing } else { value };
        if !settings.convert_enabled {
            shaped.insert(col.clone(), value.clone());
            continue;
        }
        if settings.convert_to == ConvertType::Unsupported {
            continue;
        }
        match convert(value, settings.convert_to) {
            Some(converted) => {
                shaped.insert(col.clone(), converted);
            }
            None if settings.include_failed_conversions => {
                shaped.insert(col.clone(), value.clone());
            }
            None => {
                error!(
                    column = %col,
                    value = %value,
                    convert_to = settings.convert_to.as_str(),
                    "failed converting"
                );
            }
        }
    }

    for col in filter_features {
        if !shaped.contains_key(col) {
            shaped.insert(col.clone(), missing.clone());
        }
    }
    if settings.check_missing_predict && !shaped.contains_key(&settings.predict_feature) {
        shaped.insert(settings.predict_feature.clone(), missing);
    }

    Some(shaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;

    fn settings(vars: &[(&str, &str)]) -> RequestSettings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RequestSettings::from_lookup(move |key: &str| map.get(key).cloned())
    }

    fn template() -> Value {
        json!({"label": "old", "title": "template", "dataset": "/data/full.csv"})
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert!(s.publish_enabled);
        assert_eq!(s.request_file, PathBuf::from(DEFAULT_REQUEST_FILE));
        assert_eq!(s.model_name, DEFAULT_MODEL_NAME);
        assert_eq!(s.seed, 42);
        assert_eq!(s.test_size, 0.2);
        assert_eq!(s.batch_size, 32);
        assert_eq!(s.epochs, 15);
        assert_eq!(s.num_splits, 3);
        assert_eq!(s.convert_to, ConvertType::Float);
        assert!(!s.include_failed_conversions);
        assert!(s.features_to_process.is_empty());
    }

    #[test]
    fn test_filter_features_drop_predict_and_ignored() {
        let s = settings(&[
            ("ANTINEX_FEATURES_TO_PROCESS", "idx,tcp_seq,label_value,ip_src,tcp_ack"),
            ("ANTINEX_IGNORE_FEATURES", "ip_src"),
        ]);
        assert_eq!(s.filter_features(), vec!["idx", "tcp_seq", "tcp_ack"]);
    }

    #[test]
    fn test_disabled() {
        let s = settings(&[("ANTINEX_PUBLISH_ENABLED", "0")]);
        let res = generate_ai_request(&[json!({"a": 1})], Some(&template()), &s);
        assert_eq!(res.status, Status::Disabled);
        assert_eq!(res.error, "disabled");
    }

    #[test]
    fn test_requires_rows() {
        let res = generate_ai_request(&[], Some(&template()), &settings(&[]));
        assert_eq!(res.status, Status::Failed);
        assert_eq!(res.error, "please provide a list of predict_rows");
    }

    #[test]
    fn test_missing_template_file_fails() {
        let s = settings(&[("ANTINEX_PUBLISH_REQUEST_FILE", "/does/not/exist.json")]);
        let res = generate_ai_request(&[json!({"tcp_seq": 1})], None, &s);
        assert_eq!(res.status, Status::Failed);
        assert!(res.error.starts_with("failed to load request body"));
    }

    #[test]
    fn test_unparseable_template_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let path = file.path().display().to_string();
        let s = settings(&[("ANTINEX_PUBLISH_REQUEST_FILE", path.as_str())]);
        let res = generate_ai_request(&[json!({"tcp_seq": 1})], None, &s);
        assert_eq!(res.status, Status::Error);
        assert!(res.error.contains("failed parsing"));
    }

    #[test]
    fn test_template_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({"title": "from file"})).unwrap();
        let path = file.path().display().to_string();
        let s = settings(&[("ANTINEX_PUBLISH_REQUEST_FILE", path.as_str())]);
        let res = generate_ai_request(&[json!({"tcp_seq": 1})], None, &s);
        assert!(res.is_success());
        assert_eq!(res.data.unwrap()["title"], "from file");
    }

    #[test]
    fn test_rows_are_filtered_converted_and_filled() {
        let s = settings(&[
            ("ANTINEX_FEATURES_TO_PROCESS", "tcp_seq,tcp_ack,label_value,ip_src"),
            ("ANTINEX_IGNORE_FEATURES", "ip_src"),
        ]);
        let rows = vec![json!({"tcp_seq": "7", "tcp_ack": 0, "ip_src": "10.0.0.1", "extra": 3})];
        let res = generate_ai_request(&rows, Some(&template()), &s);
        assert!(res.is_success(), "{}", res.error);
        let body = res.data.unwrap();
        let row = &body["predict_rows"][0];
        assert_eq!(row["tcp_seq"], json!(7.0));
        // falsy values are replaced first and then converted
        assert_eq!(row["tcp_ack"], json!(-1.0));
        // absent columns keep the configured text
        assert_eq!(row["label_value"], "-1.0");
        assert!(row.get("ip_src").is_none());
        assert!(row.get("extra").is_none());

        assert_eq!(body["label"], DEFAULT_MODEL_NAME);
        assert_eq!(body["title"], "template");
        assert_eq!(body["features_to_process"], json!(["tcp_seq", "tcp_ack"]));
        assert_eq!(body["ignore_features"], json!(["ip_src"]));
        assert!(body.get("sort_values").is_none());
        assert_eq!(body["seed"], 42);
        assert_eq!(body["publish_to_core"], true);
    }

    #[test]
    fn test_failed_conversions_dropped_or_kept() {
        let vars = [("ANTINEX_FEATURES_TO_PROCESS", "proto")];
        let rows = vec![json!({"proto": "tcp"})];

        let dropped = generate_ai_request(&rows, Some(&template()), &settings(&vars));
        // absent after a failed conversion, so refilled with the missing value
        assert_eq!(dropped.data.unwrap()["predict_rows"][0]["proto"], "-1.0");

        let mut keep = settings(&vars);
        keep.include_failed_conversions = true;
        let kept = generate_ai_request(&rows, Some(&template()), &keep);
        assert_eq!(kept.data.unwrap()["predict_rows"][0]["proto"], "tcp");
    }

    #[test]
    fn test_int_conversion_and_no_conversion() {
        let vars = [
            ("ANTINEX_FEATURES_TO_PROCESS", "a,b"),
            ("ANTINEX_CONVERT_DATA_TYPE", "int"),
            ("ANTINEX_MISSING_VALUE", "-1"),
        ];
        let rows = vec![json!({"a": 3.9, "b": "12"})];
        let res = generate_ai_request(&rows, Some(&template()), &settings(&vars));
        let row = &res.data.unwrap()["predict_rows"][0];
        assert_eq!(row["a"], json!(3));
        assert_eq!(row["b"], json!(12));
        assert_eq!(row["label_value"], "-1");

        let mut raw = settings(&vars);
        raw.convert_enabled = false;
        let res = generate_ai_request(&rows, Some(&template()), &raw);
        assert_eq!(res.data.unwrap()["predict_rows"][0]["b"], "12");
    }

    #[test]
    fn test_unsupported_type_refills_columns() {
        let vars = [
            ("ANTINEX_FEATURES_TO_PROCESS", "proto,tcp_seq"),
            ("ANTINEX_CONVERT_DATA_TYPE", "str"),
            ("ANTINEX_INCLUDE_FAILED_CONVERSIONS", "1"),
        ];
        let s = settings(&vars);
        assert_eq!(s.convert_to, ConvertType::Unsupported);

        let rows = vec![json!({"proto": "tcp", "tcp_seq": 5})];
        let res = generate_ai_request(&rows, Some(&template()), &s);
        assert_eq!(
            res.data.unwrap()["predict_rows"][0],
            json!({"proto": "-1.0", "tcp_seq": "-1.0", "label_value": "-1.0"})
        );
    }

    #[test]
    fn test_non_object_row_is_an_error() {
        let res = generate_ai_request(&[json!([1, 2])], Some(&template()), &settings(&[]));
        assert_eq!(res.status, Status::Error);
        assert!(res.error.contains("predict row 0"));
    }
}
