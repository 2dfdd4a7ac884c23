use anyhow::Result;
use serde_json::Value;
use slots_application::SlotService;

pub async fn open(service: &SlotService, id: &str, amount: Option<u64>) -> Result<Value> {
    let (account, _) = service.find_account(id).await?;
    let created = service.create_session(&account, amount).await?;
    tracing::info!(
        "Opened session {} for '{}' with {}",
        created.session_id,
        created.account_id,
        created.session_balance
    );

    Ok(serde_json::to_value(created)?)
}
