use std::sync::Arc;

use missive::memory::InMemoryPublisher;
use missive_demo_users::users::{CreateUser, DeleteUser, UpdateUser, UserSummary};
use missive_demo_users::{Error, Settings, UsersApp};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let publisher = Arc::new(InMemoryPublisher::new(settings.topics()));
    let app = UsersApp::start(&settings, publisher.clone()).await?;

    let jane = app
        .execute(CreateUser {
            name: "Jane".into(),
            surname: "Doe".into(),
            password: "secret123".into(),
        })
        .await?;
    let john = app
        .execute(CreateUser {
            name: "John".into(),
            surname: "Doe".into(),
            password: "hunter2".into(),
        })
        .await?;
    app.execute(UpdateUser {
        oid: jane.oid,
        name: "Jane".into(),
        surname: "Smith".into(),
        password: "secret456".into(),
    })
    .await?;
    app.execute(DeleteUser { oid: john.oid }).await?;

    if let Err(error) = app.execute(DeleteUser { oid: john.oid }).await {
        log::warn!("Second deletion refused ({:?}): {error}", error.kind());
    }

    for user in app.list_users(1, 10).await? {
        println!("{}", serde_json::to_string(&UserSummary::from(&user))?);
    }
    for message in publisher.messages()? {
        println!("{} <- {}", message.topic, message.payload);
    }

    app.close().await
}
