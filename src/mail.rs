//! Send emails to user for important updates.

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::uri::{
    AMQPAuthority, AMQPQueryString, AMQPScheme, AMQPUri, AMQPUserInfo,
};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use serde::Serialize;
use url::Url;

use crate::config::Mail;
use crate::error::{Result, ServerError};

const DEFAULT_AMPQ_HOST: &str = "localhost";
const DEFAULT_AMPQ_PORT: u16 = 5672;
const DEFAULT_AMPQ_VHOST: &str = "/";

const CONTENT_ENCODING: &str = "utf8";
const CONTENT_TYPE: &str = "application/cloudevents+json";
const DATA_CONTENT_TYPE: &str = "application/json";
const CLOUDEVENT_VERSION: &str = "1.0";
const ID_LENGTH: usize = 12;

/// Mail templates list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Greet a freshly created account.
    Welcome,
    /// Carry a password-reset link, valid a few minutes.
    PasswordReset,
    /// Recap an admitted booking.
    BookingConfirmed,
}

#[derive(Debug, Serialize)]
struct Cloudevent<'a> {
    specversion: &'static str,
    r#type: &'static str,
    source: &'static str,
    id: String,
    time: String,
    datacontenttype: &'static str,
    data: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    to: Cow<'a, str>,
    name: Cow<'a, str>,
    template: Template,
    /// Link the template points the user at, when it carries one.
    action_url: Option<Cow<'a, str>>,
}

/// Mail-queue publisher.
#[derive(Debug, Clone, Default)]
pub struct MailManager {
    queue: String,
    conn: Option<Arc<Connection>>,
}

impl MailManager {
    /// Create a new [`MailManager`].
    pub async fn new(config: &Mail) -> Result<Self> {
        let addr = Url::parse(&config.address)?;
        let uri = AMQPUri {
            scheme: AMQPScheme::from_str(addr.scheme())
                .map_err(ServerError::upstream_permanent)?,
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: config.username.clone(),
                    password: config.password.clone(),
                },
                host: addr.host_str().unwrap_or(DEFAULT_AMPQ_HOST).into(),
                port: addr.port().unwrap_or(DEFAULT_AMPQ_PORT),
            },
            vhost: config
                .vhost
                .clone()
                .unwrap_or(DEFAULT_AMPQ_VHOST.to_string()),
            query: AMQPQueryString {
                channel_max: config.pool,
                ..Default::default()
            },
        };

        let conn_config = ConnectionProperties::default()
            .with_connection_name("renta_mail_client".into());
        let conn = Connection::connect_uri(uri, conn_config).await?;

        tracing::info!(%addr, queue = config.queue, "rabbitmq connected");

        Ok(Self {
            queue: config.queue.clone(),
            conn: Some(Arc::new(conn)),
        })
    }

    async fn create_channel(
        conn: Arc<Connection>,
        queue: &str,
    ) -> Result<Channel> {
        let channel = conn.create_channel().await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(channel)
    }

    fn create_event(data: Content<'_>) -> Cloudevent<'_> {
        let id = Alphanumeric.sample_string(&mut OsRng, ID_LENGTH);
        Cloudevent {
            specversion: CLOUDEVENT_VERSION,
            r#type: "org.renta.email",
            source: "org.renta.api",
            id,
            time: Utc::now().to_rfc3339(),
            datacontenttype: DATA_CONTENT_TYPE,
            data,
        }
    }

    /// Publish a mail event for a specific recipient.
    ///
    /// A no-op when no queue is configured, so flows depending on mail
    /// keep working on minimal deployments.
    pub async fn publish_event(
        &self,
        template: Template,
        email: &str,
        name: &str,
        action_url: Option<String>,
    ) -> Result<()> {
        let Some(conn) = &self.conn else {
            tracing::debug!(?template, "mail queue not configured, event dropped");
            return Ok(());
        };
        let channel =
            Self::create_channel(Arc::clone(conn), &self.queue).await?;

        let content = Content {
            to: Cow::from(email),
            name: Cow::from(name),
            template,
            action_url: action_url.map(Cow::from),
        };
        let payload = Self::create_event(content);
        let payload = serde_json::to_string(&payload)?;

        channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default()
                    .with_content_encoding(CONTENT_ENCODING.into())
                    .with_content_type(CONTENT_TYPE.into()),
            )
            .await?;

        tracing::trace!(queue = self.queue, "mail event published");

        Ok(())
    }
}
