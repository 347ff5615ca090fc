use serde::Serialize;

use crate::contract::model::{ForecastRow, PricingRow};
use crate::domain::plain_language::{
    Annotate, AnnotationPolicy, ForecastPlainFields, PricingPlainFields,
};

/// A row as it leaves the service: bare, or flattened together with its
/// plain-language companions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RowView<R, N> {
    Plain(R),
    Annotated {
        #[serde(flatten)]
        row: R,
        #[serde(flatten)]
        notes: N,
    },
}

pub type PricingView = RowView<PricingRow, PricingPlainFields>;
pub type ForecastView = RowView<ForecastRow, ForecastPlainFields>;

impl<R: Annotate> RowView<R, R::Notes> {
    /// Attaches notes when a policy is given. Plain rows carry no trace of
    /// the annotation keys.
    pub fn build(row: R, policy: Option<&AnnotationPolicy>) -> Self {
        match policy {
            Some(policy) => {
                let notes = row.notes(policy);
                RowView::Annotated { row, notes }
            }
            None => RowView::Plain(row),
        }
    }
}

impl<R, N> RowView<R, N> {
    pub fn row(&self) -> &R {
        match self {
            RowView::Plain(row) | RowView::Annotated { row, .. } => row,
        }
    }

    pub fn notes(&self) -> Option<&N> {
        match self {
            RowView::Plain(_) => None,
            RowView::Annotated { notes, .. } => Some(notes),
        }
    }
}
