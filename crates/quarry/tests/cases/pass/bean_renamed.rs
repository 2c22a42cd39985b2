// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use quarry::Bean;

#[derive(Bean, Clone)]
#[bean(table = "student_card", rename_all = "snake_case")]
#[allow(non_snake_case)]
pub struct StudentCard {
    #[id]
    #[field(column = "card_no")]
    pub number: String,
    pub holderName: Option<String>,
    #[field(skip)]
    pub cached_label: String,
}

fn main() {
    let descriptor = <StudentCard as Bean>::DESCRIPTOR;
    assert_eq!(descriptor.table, "student_card");
    assert_eq!(descriptor.fields[0].column, "card_no");
    assert_eq!(descriptor.fields[1].column, "holder_name");
    assert_eq!(descriptor.fields.len(), 2);
}
