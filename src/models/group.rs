// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};

use crate::store::Document;
use crate::types::GroupId;

use super::Record;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urlname: Option<String>,
    #[serde(flatten)]
    pub extra: Document,
}

impl Record for Group {
    const COLLECTION: &'static str = "groups";
}
