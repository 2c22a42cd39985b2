// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use quarry::{Bean, Value};

#[derive(Bean, Clone)]
#[bean(table = "settings")]
pub struct Setting<V>
where
    V: Clone,
    Value: From<V>
{
    #[id]
    pub name: String,
    pub value: V,
    pub flags: Vec<String>,
}

fn main() {
    let setting = Setting {
        name: "theme".to_string(),
        value: true,
        flags: vec!["AA".to_string(), "BB".to_string()],
    };
    let values = setting.field_values();
    assert_eq!(values[1], Value::Bool(true));
    assert_eq!(values[2].to_string(), "\"AA\",\"BB\"");
}
