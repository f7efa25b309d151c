//! Query responses from the file-search tool and the citations they carry.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::contract::{BoxError, Querier};

/// Structured response of a file-search query. Only the parts the pipeline reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentBlock>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    OutputText {
        text: String,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    FileCitation {
        file_id: String,
        #[serde(default)]
        filename: String,
    },
    #[serde(other)]
    Other,
}

/// A document the answer cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub filename: String,
    pub file_id: String,
}

impl QueryResponse {
    fn output_texts(&self) -> impl Iterator<Item = (&String, &Vec<Annotation>)> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content } => Some(content),
                OutputItem::Other => None,
            })
            .flatten()
            .filter_map(|block| match block {
                ContentBlock::OutputText { text, annotations } => Some((text, annotations)),
                ContentBlock::Other => None,
            })
    }

    /// All output text blocks joined by blank lines.
    pub fn answer_text(&self) -> String {
        self.output_texts()
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// File citations in the order they appear.
    pub fn citations(&self) -> Vec<Citation> {
        self.output_texts()
            .flat_map(|(_, annotations)| annotations)
            .filter_map(|annotation| match annotation {
                Annotation::FileCitation { file_id, filename } => Some(Citation {
                    filename: filename.clone(),
                    file_id: file_id.clone(),
                }),
                Annotation::Other => None,
            })
            .collect()
    }
}

/// A query answer with its citations extracted.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Ask `question` against the given indexes.
pub async fn ask<Q>(querier: &Q, question: &str, index_ids: &[String]) -> Result<QueryAnswer, BoxError>
where
    Q: Querier + ?Sized,
{
    info!(question, indexes = ?index_ids, "[QUERY] Sending file search query");
    let response = querier.query(question, index_ids).await.map_err(|e| {
        error!(error = ?e, "[QUERY][ERROR] Query failed");
        e
    })?;
    let answer = QueryAnswer {
        text: response.answer_text(),
        citations: response.citations(),
    };
    info!(citations = answer.citations.len(), "[QUERY] Answer received");
    Ok(answer)
}
