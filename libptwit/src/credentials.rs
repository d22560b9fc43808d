//! Credential resolution and login
//!
//! Credentials live in the config store. The consumer (application) pair may
//! be shared: an account without its own pair inherits the one in the general
//! scope. The access-token pair is always per account and never inherited.
//!
//! Obtaining missing credentials is delegated to an [`Authorizer`]: it prompts
//! for a consumer pair and runs the OAuth authorization that turns a consumer
//! pair into an access-token pair. This module only decides when to ask and
//! where to store the answers. When no account name is given, the name comes
//! from the API: the authenticated screen name (see [`login_as_screen_name`]).

use std::fmt;

use tracing::{debug, info};

use crate::client::Client;
use crate::config::{validate_account_name, ConfigStore, CURRENT_ACCOUNT};
use crate::error::{ConfigError, PtwitError, Result};

pub const CONSUMER_KEY: &str = "consumer_key";
pub const CONSUMER_SECRET: &str = "consumer_secret";
pub const TOKEN_KEY: &str = "token_key";
pub const TOKEN_SECRET: &str = "token_secret";

/// Application credentials issued by the API provider
#[derive(Clone, PartialEq, Eq)]
pub struct ConsumerPair {
    pub key: String,
    pub secret: String,
}

/// Access token authorizing one account
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub key: String,
    pub secret: String,
}

// Secrets stay out of logs
impl fmt::Debug for ConsumerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerPair")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Everything needed to build an authenticated client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer: ConsumerPair,
    pub token: TokenPair,
}

/// Source of credentials the store does not have yet
pub trait Authorizer {
    /// Ask the user for the consumer pair
    fn prompt_consumer(&self) -> Result<ConsumerPair>;

    /// Run the OAuth authorization for `consumer`
    fn authorize(&self, consumer: &ConsumerPair) -> Result<TokenPair>;
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Consumer pair for `account`, each half falling back to the general scope
pub fn resolve_consumer(store: &ConfigStore, account: Option<&str>) -> Option<ConsumerPair> {
    let key = non_empty(store.get(CONSUMER_KEY, account))
        .or_else(|| non_empty(store.get(CONSUMER_KEY, None)))?;
    let secret = non_empty(store.get(CONSUMER_SECRET, account))
        .or_else(|| non_empty(store.get(CONSUMER_SECRET, None)))?;
    Some(ConsumerPair { key, secret })
}

/// Access-token pair stored in `account` itself
pub fn resolve_token(store: &ConfigStore, account: &str) -> Option<TokenPair> {
    let key = non_empty(store.get(TOKEN_KEY, Some(account)))?;
    let secret = non_empty(store.get(TOKEN_SECRET, Some(account)))?;
    Some(TokenPair { key, secret })
}

/// Complete credentials for `account`, if the store has them
pub fn resolve(store: &ConfigStore, account: &str) -> Option<Credentials> {
    Some(Credentials {
        consumer: resolve_consumer(store, Some(account))?,
        token: resolve_token(store, account)?,
    })
}

/// Make `consumer` the shared pair unless the general scope already has one
fn inherit_consumer(store: &mut ConfigStore, consumer: &ConsumerPair) {
    if non_empty(store.get(CONSUMER_KEY, None)).is_none() {
        store.set(CONSUMER_KEY, consumer.key.as_str(), None);
    }
    if non_empty(store.get(CONSUMER_SECRET, None)).is_none() {
        store.set(CONSUMER_SECRET, consumer.secret.as_str(), None);
    }
}

/// Persist credentials for `account` and make it the current account
///
/// The consumer pair is copied into the general scope when that has none,
/// and refreshed in the account scope only where the account already kept
/// its own copy.
pub fn record(store: &mut ConfigStore, account: &str, credentials: &Credentials) -> Result<()> {
    let consumer = &credentials.consumer;
    inherit_consumer(store, consumer);

    if store.get(CONSUMER_KEY, Some(account)).is_some() {
        store.set(CONSUMER_KEY, consumer.key.as_str(), Some(account));
    }
    if store.get(CONSUMER_SECRET, Some(account)).is_some() {
        store.set(CONSUMER_SECRET, consumer.secret.as_str(), Some(account));
    }

    store
        .set(TOKEN_KEY, credentials.token.key.as_str(), Some(account))
        .set(TOKEN_SECRET, credentials.token.secret.as_str(), Some(account))
        .set(CURRENT_ACCOUNT, account, None);

    store.save()
}

/// Consumer pair for `account`, prompting when the store has none
fn consumer_or_prompt(
    store: &ConfigStore,
    account: Option<&str>,
    authorizer: &dyn Authorizer,
) -> Result<ConsumerPair> {
    if let Some(consumer) = resolve_consumer(store, account) {
        return Ok(consumer);
    }

    debug!("No consumer pair for {:?}, prompting", account);
    let consumer = authorizer.prompt_consumer()?;
    let consumer = ConsumerPair {
        key: consumer.key.trim().to_string(),
        secret: consumer.secret.trim().to_string(),
    };
    if consumer.key.is_empty() || consumer.secret.is_empty() {
        return Err(PtwitError::InvalidInput(
            "Consumer key and secret must not be empty".to_string(),
        ));
    }
    Ok(consumer)
}

/// Run `authorizer`, saving what was gathered so far when it fails
fn authorize_or_save(
    store: &mut ConfigStore,
    consumer: &ConsumerPair,
    authorizer: &dyn Authorizer,
) -> Result<TokenPair> {
    match authorizer.authorize(consumer) {
        Ok(token) => Ok(token),
        Err(e) => {
            store.save()?;
            Err(e)
        }
    }
}

/// Resolve credentials for `account`, asking `authorizer` for what is missing
///
/// On success the credentials are recorded (see [`record`]) and `account`
/// becomes current. If authorization fails, a freshly entered consumer pair
/// is still saved to the general scope so it is not asked for again.
pub fn login(
    store: &mut ConfigStore,
    account: &str,
    authorizer: &dyn Authorizer,
) -> Result<Credentials> {
    validate_account_name(account)?;

    let consumer = consumer_or_prompt(store, Some(account), authorizer)?;
    inherit_consumer(store, &consumer);

    let token = match resolve_token(store, account) {
        Some(token) => token,
        None => {
            info!("Authorizing new account '{}'", account);
            authorize_or_save(store, &consumer, authorizer)?
        }
    };

    let credentials = Credentials { consumer, token };
    record(store, account, &credentials)?;
    Ok(credentials)
}

/// Account name for the user `client` is authenticated as
///
/// The screen name is used as is; it must be a valid account name that is
/// not taken by an existing account.
pub async fn propose_account_name(client: &dyn Client, store: &ConfigStore) -> Result<String> {
    let identity = client.verify_identity().await?;
    let name = identity.screen_name;
    validate_account_name(&name)?;

    if store.list_scopes().contains(&name.as_str()) {
        return Err(ConfigError::AccountExists(name).into());
    }
    Ok(name)
}

/// Log into a new account named after the authenticated user
///
/// Uses the shared consumer pair (prompting when there is none) and always
/// runs the authorization. `connect` builds a client from the new
/// credentials; its identity names the account (see
/// [`propose_account_name`]). The credentials are then recorded as in
/// [`login`]. Returns the account name with its credentials.
pub async fn login_as_screen_name<C, F>(
    store: &mut ConfigStore,
    authorizer: &dyn Authorizer,
    connect: F,
) -> Result<(String, Credentials)>
where
    C: Client,
    F: FnOnce(&Credentials) -> Result<C>,
{
    let consumer = consumer_or_prompt(store, None, authorizer)?;
    inherit_consumer(store, &consumer);

    info!("Authorizing a new account");
    let token = authorize_or_save(store, &consumer, authorizer)?;
    let credentials = Credentials { consumer, token };

    let client = connect(&credentials)?;
    let proposed = propose_account_name(&client, store).await;
    let account = match proposed {
        Ok(account) => account,
        Err(e) => {
            store.save()?;
            return Err(e);
        }
    };

    debug!("Authenticated as '{}'", account);
    record(store, &account, &credentials)?;
    Ok((account, credentials))
}

/// Remove `account` and everything stored under it
///
/// Clears `current_account` when it pointed at `account`. Returns false when
/// the account did not exist.
pub fn logout(store: &mut ConfigStore, account: &str) -> Result<bool> {
    if !store.has_scope(account) {
        return Ok(false);
    }

    store.remove_scope(account);
    if store.current_account() == Some(account) {
        store.unset(CURRENT_ACCOUNT, None);
    }
    store.save()?;
    Ok(true)
}
