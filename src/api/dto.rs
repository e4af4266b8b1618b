use serde::{Deserialize, Serialize};

use crate::domain::{BackReference, CallTree, OriginHint};
use crate::ports::{SelectedTree, Selection};

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionDto {
    pub trees: Vec<SelectedTreeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedTreeDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginDto>,
    pub tree: CallTreeDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OriginDto {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub is_root: bool,
    pub is_static: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallTreeDto {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub depth: usize,
    /// Line number in the cflow output this entry came from.
    pub source_line: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub see_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallTreeDto>,
}

impl From<&CallTree> for CallTreeDto {
    fn from(tree: &CallTree) -> Self {
        let record = &tree.record;
        CallTreeDto {
            name: record.name.clone(),
            signature: record.signature.clone(),
            file: record.location.as_ref().map(|l| l.file.clone()),
            line: record.location.as_ref().map(|l| l.line),
            depth: tree.depth,
            source_line: record.line,
            is_static: record.is_static,
            recursive: record.recursive
                || matches!(record.back_reference, Some(BackReference::Recursive(_))),
            truncated: tree.truncated,
            see_line: record.back_reference.map(|back| match back {
                BackReference::Recursive(line) | BackReference::AlreadyShown(line) => line,
            }),
            calls: tree.children.iter().map(CallTreeDto::from).collect(),
        }
    }
}

impl From<&OriginHint> for OriginDto {
    fn from(origin: &OriginHint) -> Self {
        OriginDto {
            file: origin.location.as_ref().map(|l| l.file.clone()),
            line: origin.location.as_ref().map(|l| l.line),
            is_root: origin.is_root,
            is_static: origin.is_static,
        }
    }
}

impl From<&SelectedTree> for SelectedTreeDto {
    fn from(selected: &SelectedTree) -> Self {
        SelectedTreeDto {
            origin: selected.origin.as_ref().map(OriginDto::from),
            tree: CallTreeDto::from(&selected.tree),
        }
    }
}

impl From<&Selection<'_>> for SelectionDto {
    fn from(selection: &Selection<'_>) -> Self {
        SelectionDto {
            trees: selection.trees.iter().map(SelectedTreeDto::from).collect(),
        }
    }
}
