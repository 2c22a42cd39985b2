// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use quarry::prelude::*;

#[derive(Bean, Clone)]
pub struct T {
    pub key: Option<String>,
}

fn main() {
    let sql = BeanTranslator::default()
        .insert(&T { key: None }, true)
        .unwrap();
    assert_eq!(sql, "INSERT INTO ${dbpre}.T(key) VALUES(NULL)");
    assert!(<T as Bean>::DESCRIPTOR.primary_key().is_none());
}
