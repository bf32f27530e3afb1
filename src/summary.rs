// 📊 Summary & History View - aggregate cards plus one history row per record

use crate::record::{format_number, Record, RecordType};
use serde::Serialize;

pub const SUMMARY_TITLE: &str = "Summary Overview";
pub const HISTORY_TITLE: &str = "History";
pub const EMPTY_HISTORY: &str = "No history yet.";

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub expense: usize,
    pub activity: usize,
    pub habit: usize,
    pub work: usize,

    /// Sum of `amount` over expense records (non-numeric amounts count as 0)
    pub total_expense: f64,
}

impl SummaryStats {
    pub fn compute(records: &[Record]) -> Self {
        let mut stats = SummaryStats {
            total: records.len(),
            ..Default::default()
        };

        for record in records {
            match record.record_type {
                RecordType::Expense => {
                    stats.expense += 1;
                    stats.total_expense += record.amount();
                }
                RecordType::Activity => stats.activity += 1,
                RecordType::Habit => stats.habit += 1,
                RecordType::Work => stats.work += 1,
                RecordType::Other(_) => {}
            }
        }

        stats
    }

    pub fn count_for(&self, record_type: &RecordType) -> usize {
        match record_type {
            RecordType::Expense => self.expense,
            RecordType::Activity => self.activity,
            RecordType::Habit => self.habit,
            RecordType::Work => self.work,
            RecordType::Other(_) => 0,
        }
    }

    pub fn cards(&self) -> Vec<SummaryCard> {
        let mut cards = vec![SummaryCard {
            label: "Total Records".to_string(),
            value: self.total.to_string(),
            kind: CardKind::Total,
        }];

        for record_type in RecordType::tracked() {
            cards.push(SummaryCard {
                label: record_type.label().to_string(),
                value: self.count_for(&record_type).to_string(),
                kind: CardKind::Count(record_type),
            });
        }

        cards.push(SummaryCard {
            label: "Total Spent".to_string(),
            value: format!("${}", format_number(self.total_expense)),
            kind: CardKind::Highlight,
        });

        cards
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Total,
    Count(RecordType),
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub label: String,
    pub value: String,
    pub kind: CardKind,
}

// ============================================================================
// HISTORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    /// 1-based number shown in the `#` column
    pub number: usize,

    /// 0-based store position the delete action targets
    pub index: usize,

    pub record_type: String,
    pub primary_info: String,
    pub date: String,
}

impl HistoryRow {
    /// Text a delete action carries back to the store
    pub fn delete_key(&self) -> String {
        self.index.to_string()
    }
}

/// Rows are recomputed on every render, so indices always match the current store order
pub fn history_rows(records: &[Record]) -> Vec<HistoryRow> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| HistoryRow {
            number: index + 1,
            index,
            record_type: record.record_type.to_string(),
            primary_info: record.primary_info(),
            date: record.date.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub title: &'static str,
    pub stats: SummaryStats,
    pub cards: Vec<SummaryCard>,
    pub history_title: &'static str,
    pub history: Vec<HistoryRow>,

    /// Shown instead of the table when there is no history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
}

impl SummaryView {
    pub fn build(records: &[Record]) -> Self {
        let stats = SummaryStats::compute(records);
        let history = history_rows(records);

        Self {
            title: SUMMARY_TITLE,
            cards: stats.cards(),
            stats,
            history_title: HISTORY_TITLE,
            empty_message: history.is_empty().then_some(EMPTY_HISTORY),
            history,
        }
    }
}
