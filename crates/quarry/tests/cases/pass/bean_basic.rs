// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use quarry::{Bean, BeanTranslator};

#[derive(Bean, Debug, Clone)]
pub struct UserInfo {
    #[id]
    pub id: Option<i32>,
    pub name: Option<String>,
    pub age: Option<i32>,
}

fn main() {
    let user = UserInfo {
        id: Some(33),
        name: None,
        age: Some(18),
    };
    let sql = BeanTranslator::default().insert(&user, false).unwrap();
    assert_eq!(sql, "INSERT INTO UserInfo(id,name,age) VALUES('33',NULL,'18')");
    assert_eq!(<UserInfo as Bean>::DESCRIPTOR.fields.len(), 3);
}
