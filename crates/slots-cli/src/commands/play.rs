use anyhow::Result;
use serde_json::Value;
use slots_application::{ROLL_COST, SlotService};
use slots_core::LedgerError;

/// Spins up to `times` times, stopping once the session can't pay for another.
///
/// A single spin prints the bare result; several print an array.
pub async fn roll(service: &SlotService, id: &str, times: u32) -> Result<Value> {
    let (_, session) = service.find_account(id).await?;
    let session = session.ok_or_else(|| LedgerError::no_active_session(id))?;

    let mut results = Vec::new();
    for _ in 0..times {
        let result = service.roll(&session).await?;
        let balance = result.new_balance;
        results.push(result);
        if balance < ROLL_COST {
            break;
        }
    }

    if let Some(last) = results.last() {
        tracing::info!(
            "Rolled {} time(s) for '{}', session balance now {}",
            results.len(),
            id,
            last.new_balance
        );
    }

    if results.len() == 1 {
        Ok(serde_json::to_value(&results[0])?)
    } else {
        Ok(serde_json::to_value(&results)?)
    }
}

pub async fn cashout(service: &SlotService, id: &str) -> Result<Value> {
    let (account, session) = service.find_account(id).await?;
    let account = service.cashout(&account, session.as_ref()).await?;
    tracing::info!("Cashed out '{}', balance now {}", account.id, account.balance);

    Ok(serde_json::to_value(service.get_account(&account, None))?)
}
