//! Block distribution of records across recipients
//!
//! The input is split into contiguous, order-preserving blocks, one per
//! recipient. Every block holds `N / k` records; the first `N % k`
//! recipients in order take one extra each.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistributionError {
    #[error("No records found in the file")]
    EmptyBatch,

    #[error("No recipients to distribute to")]
    NoRecipients,
}

/// One recipient and the records assigned to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<A, T> {
    pub recipient: A,
    pub items: Vec<T>,
}

/// Block sizes for `total` items across `recipients` slots
pub fn block_sizes(total: usize, recipients: usize) -> Vec<usize> {
    if recipients == 0 {
        return Vec::new();
    }

    let per_recipient = total / recipients;
    let remainder = total % recipients;

    (0..recipients)
        .map(|i| per_recipient + usize::from(i < remainder))
        .collect()
}

/// Partition `items` across `recipients`, preserving the order of both
pub fn distribute<A, T>(
    items: Vec<T>,
    recipients: Vec<A>,
) -> Result<Vec<Assignment<A, T>>, DistributionError> {
    if recipients.is_empty() {
        return Err(DistributionError::NoRecipients);
    }
    if items.is_empty() {
        return Err(DistributionError::EmptyBatch);
    }

    let sizes = block_sizes(items.len(), recipients.len());
    let mut remaining = items.into_iter();

    Ok(recipients
        .into_iter()
        .zip(sizes)
        .map(|(recipient, size)| Assignment {
            recipient,
            items: remaining.by_ref().take(size).collect(),
        })
        .collect())
}
