use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// 一条 profile 固定覆盖一天24小时
pub const HOURS: usize = 24;

/// 一条节能措施：名字 + 每小时的影响量
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub name: String,
    pub profile: Vec<f64>,
}

impl Measure {
    pub fn new(name: impl Into<String>, profile: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            profile,
        }
    }
}

/// 内置的三条示例措施，输入缺失或解析失败时兜底
pub fn defaults() -> Vec<Measure> {
    vec![
        Measure::new(
            "HVAC setpoint optimization",
            vec![
                1.5096, 1.5276, 1.6764, 1.8024, 1.998, 2.1468, 2.3376, 2.4636, 2.5284, 2.6184,
                2.634, 2.5932, 2.5404, 2.388, 2.3028, 2.1924, 1.95, 1.8624, 1.7304, 1.5684,
                1.4376, 1.4328, 1.3944, 1.4532,
            ],
        ),
        Measure::new(
            "LED retrofit",
            vec![
                1.0064, 1.0184, 1.1176, 1.2016, 1.332, 1.4312, 1.5584, 1.6424, 1.6856, 1.7456,
                1.756, 1.7288, 1.6936, 1.592, 1.5352, 1.4616, 1.3, 1.2416, 1.1536, 1.0456,
                0.9584, 0.9552, 0.9296, 0.9688,
            ],
        ),
        Measure::new(
            "Occupancy sensors",
            vec![
                0.80512, 0.81472, 0.89408, 0.96128, 1.0656, 1.14496, 1.24672, 1.31392, 1.34848,
                1.39648, 1.4048, 1.38304, 1.35488, 1.2736, 1.22816, 1.16928, 1.04, 0.99328,
                0.92288, 0.83648, 0.76672, 0.76416, 0.74368, 0.77504,
            ],
        ),
    ]
}

/// 读文件并尽力提取措施；文件读不出来或不是 JSON 返回 Err，
/// 形态不认识只会得到空列表
pub fn from_file(path: &Path) -> Result<Vec<Measure>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let payload: Value = serde_json::from_str(&text)?;
    Ok(extract(&payload))
}

/// 显式 measures 数组里的一条记录，字段名有几种常见写法
#[derive(Debug, Deserialize)]
struct RawMeasure {
    name: Option<String>,
    label: Option<String>,
    impact_profile: Option<Value>,
    impact: Option<Value>,
    profile: Option<Value>,
}

/// 四种兼容形态按优先级尝试，第一个命中至少一条的策略生效。
/// 搜索范围是根对象的 data 成员，没有就用根对象本身
fn extract(payload: &Value) -> Vec<Measure> {
    let Some(root) = payload.as_object() else {
        return Vec::new();
    };
    let scope = match root.get("data") {
        Some(Value::Object(data)) => data,
        _ => root,
    };

    let strategies: [(&str, fn(&Map<String, Value>) -> Vec<Measure>); 4] = [
        ("measures list", from_measures_list),
        ("measure-prefixed keys", from_measure_keys),
        ("_kwh keys", from_kwh_keys),
        ("nested profiles", from_nested_profiles),
    ];
    for (label, strategy) in strategies {
        let found = strategy(scope);
        if !found.is_empty() {
            debug!("extracted {} measures via {}", found.len(), label);
            return found;
        }
    }
    Vec::new()
}

/// 形态(a)：scope.measures 是对象数组，逐条取名字和 profile
fn from_measures_list(scope: &Map<String, Value>) -> Vec<Measure> {
    let Some(Value::Array(entries)) = scope.get("measures") else {
        return Vec::new();
    };
    let mut measures = Vec::new();
    for entry in entries {
        let Ok(raw) = serde_json::from_value::<RawMeasure>(entry.clone()) else {
            continue;
        };
        let profile = [&raw.impact_profile, &raw.impact, &raw.profile]
            .into_iter()
            .flatten()
            .next()
            .and_then(valid_profile);
        if let Some(profile) = profile {
            let name = raw
                .name
                .or(raw.label)
                .unwrap_or_else(|| "measure".to_string());
            measures.push(Measure { name, profile });
        }
    }
    measures
}

/// 形态(b)：以 measure 开头的兄弟键，值是数组或带 profile 的对象
fn from_measure_keys(scope: &Map<String, Value>) -> Vec<Measure> {
    let mut keys: Vec<&String> = scope
        .keys()
        .filter(|key| key.to_lowercase().starts_with("measure"))
        .collect();
    keys.sort();

    let mut measures = Vec::new();
    for key in keys {
        match &scope[key.as_str()] {
            Value::Object(entry) => {
                let profile = ["impact_profile", "impact", "impact_profile_kwh"]
                    .into_iter()
                    .find_map(|field| entry.get(field))
                    .and_then(valid_profile);
                if let Some(profile) = profile {
                    let name = entry
                        .get("name")
                        .or_else(|| entry.get("label"))
                        .and_then(Value::as_str)
                        .unwrap_or(key)
                        .to_string();
                    measures.push(Measure { name, profile });
                }
            }
            value => {
                if let Some(profile) = valid_profile(value) {
                    measures.push(Measure {
                        name: key.clone(),
                        profile,
                    });
                }
            }
        }
    }
    measures
}

/// 形态(c)：_kwh 结尾的键直接挂着24小时数组
fn from_kwh_keys(scope: &Map<String, Value>) -> Vec<Measure> {
    let mut keys: Vec<&String> = scope
        .keys()
        .filter(|key| key.to_lowercase().ends_with("_kwh"))
        .collect();
    keys.sort();

    keys.into_iter()
        .filter_map(|key| {
            valid_profile(&scope[key.as_str()]).map(|profile| Measure {
                name: key.clone(),
                profile,
            })
        })
        .collect()
}

/// 形态(d)：深度优先找任意位置带 impact_profile 的对象
fn from_nested_profiles(scope: &Map<String, Value>) -> Vec<Measure> {
    let mut measures = Vec::new();
    for (key, value) in scope {
        collect_nested(key, value, &mut measures);
    }
    measures
}

fn collect_nested(parent: &str, value: &Value, out: &mut Vec<Measure>) {
    match value {
        Value::Object(entry) => {
            if let Some(profile) = entry.get("impact_profile").and_then(valid_profile) {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(parent)
                    .to_string();
                out.push(Measure { name, profile });
            } else {
                for (key, nested) in entry {
                    collect_nested(key, nested, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_nested(parent, item, out);
            }
        }
        _ => {}
    }
}

/// 合法的 profile：恰好24个数值，长度或类型不对整条丢弃
fn valid_profile(value: &Value) -> Option<Vec<f64>> {
    let list = value.as_array()?;
    if list.len() != HOURS {
        return None;
    }
    list.iter().map(Value::as_f64).collect()
}
