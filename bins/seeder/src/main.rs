//! Database seeder for Roomie development and testing.
//!
//! Seeds a demo group with three tenants and one shared expense, then prints
//! an access token per tenant for trying the API by hand.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use roomie_core::types::{CreateExpenseInput, Tenant};
use roomie_core::{ExpenseService, TracingNotifier};
use roomie_db::entities::{tenants, users};
use roomie_db::{PgLedgerStore, TenantRepository};
use roomie_shared::{AppConfig, JwtService, UserRole};

const DEMO_GROUP: &str = "Maple Street Flat";
const DEMO_TENANTS: [(&str, &str); 3] = [
    ("alice@roomie.dev", "Alice Moreau"),
    ("bob@roomie.dev", "Bob Lindqvist"),
    ("carol@roomie.dev", "Carol Okafor"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = roomie_db::connect(&config.database).await?;
    let repo = TenantRepository::new(db.clone());

    if find_tenant_by_email(&db, DEMO_TENANTS[0].0).await?.is_some() {
        println!("  Demo tenants already exist, skipping...");
    } else {
        println!("Seeding demo group...");
        let group = repo.create_group(DEMO_GROUP).await?;

        println!("Seeding demo tenants...");
        let mut seeded = Vec::new();
        for (email, name) in DEMO_TENANTS {
            let user = repo.create_user(email, name, UserRole::Tenant).await?;
            let tenant = repo.create_tenant(user.id, name, Some(group.id)).await?;
            seeded.push(Tenant::from(tenant));
        }

        println!("Seeding demo expense...");
        let expenses = ExpenseService::new(
            Arc::new(PgLedgerStore::new(db.clone())),
            Arc::new(TracingNotifier),
        );
        let created = expenses
            .create_expense(CreateExpenseInput {
                category: "Groceries".to_string(),
                title: "Welcome dinner".to_string(),
                description: Some("First shared shop".to_string()),
                receipt_total: Decimal::new(9000, 2),
                group_id: group.id.into(),
                created_by: seeded[0].id,
                participants: seeded.iter().map(|t| t.id).collect(),
            })
            .await?;
        println!(
            "  Expense {} split into {} shares",
            created.expense.id,
            created.splits.len()
        );
    }

    println!("Development access tokens:");
    let jwt = JwtService::new(&config.jwt);
    for (email, _) in DEMO_TENANTS {
        if let Some(tenant) = find_tenant_by_email(&db, email).await? {
            let token = jwt.issue_access_token(tenant.user_id.into(), UserRole::Tenant)?;
            println!("  {email} (tenant {}): {token}", tenant.id);
        }
    }

    println!("Seeding complete!");
    Ok(())
}

async fn find_tenant_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<tenants::Model>, sea_orm::DbErr> {
    let Some(user) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    tenants::Entity::find()
        .filter(tenants::Column::UserId.eq(user.id))
        .one(db)
        .await
}
