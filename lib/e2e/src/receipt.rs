use alloy::{network::ReceiptResponse, rpc::types::TransactionReceipt};
use eyre::bail;

/// Turns a mined-but-failed transaction into an error.
///
/// # Errors
///
/// If the receipt's status is not success.
pub fn ensure_success(
    receipt: TransactionReceipt,
) -> eyre::Result<TransactionReceipt> {
    if !receipt.status() {
        bail!(
            "transaction {} was mined but reverted",
            receipt.transaction_hash
        );
    }
    Ok(receipt)
}

/// Sends a contract call built with `alloy`'s `sol!` bindings.
///
/// Evaluates to the result of `send()`, so a call the node refuses to
/// estimate (i.e. one that would revert) comes back as
/// `Err(alloy::contract::Error)`.
#[macro_export]
macro_rules! send {
    ($e:expr) => {
        $e.send().await
    };
}

/// Sends a contract call, waits for its receipt and checks its status.
#[macro_export]
macro_rules! receipt {
    ($e:expr) => {
        async {
            let pending = $e.send().await?;
            let receipt = pending.get_receipt().await?;
            $crate::ensure_success(receipt)
        }
        .await
    };
}
