use anyhow::Result;
use serde_json::{Value, json};
use slots_application::SlotService;

pub async fn create(service: &SlotService, id: &str, balance: Option<u64>) -> Result<Value> {
    let account = service.create_account(id, balance).await?;
    tracing::info!("Created account '{}' with balance {}", account.id, account.balance);

    Ok(json!({
        "id": account.id,
        "balance": account.balance,
        "createdAt": account.created_at,
    }))
}

pub async fn show(service: &SlotService, id: &str) -> Result<Value> {
    let (account, session) = service.find_account(id).await?;
    let view = service.get_account(&account, session.as_ref());

    Ok(serde_json::to_value(view)?)
}
