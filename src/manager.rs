//! Request-level session orchestration.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::SessionConfig;
use crate::context::RequestContext;
use crate::cookie::{CookieSink, CookieSource, CookieTransport};
use crate::events::{SessionEvent, dispatch};
use crate::store::{SessionStore, StoreConfig};
use crate::transport::{IdOrigin, SessionTransport};
use crate::{IdGenerator, SessionError, SessionId};

/// How the identifier of a [`SessionLoad`] was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The request's identifier resolved to a stored record.
    Resolved,
    /// The request's identifier had no live record and was replaced with a
    /// freshly issued one. The new binding reaches the client on save.
    Rotated,
}

/// Result of [`SessionManager::load_or_new`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLoad<P> {
    /// Identifier to pass back to `save` or `delete`.
    pub id: SessionId,
    /// Decoded payload; `None` for a new session.
    pub data: Option<P>,
    pub state: LoadState,
}

impl<P> SessionLoad<P> {
    pub fn found(&self) -> bool {
        self.data.is_some()
    }
}

/// Loads, saves and deletes sessions for requests.
///
/// The manager never trusts an identifier it cannot resolve: a presented
/// identifier without a live record is discarded and a new one is issued in
/// its place, so a client cannot choose its own session identifier.
///
/// Handlers must call [`save`](Self::save) on every request that should keep
/// its session alive, even when the payload is unchanged; saving refreshes
/// both the record and the cookie lifetime.
pub struct SessionManager<T, S, C = JsonCodec> {
    transport: T,
    store: S,
    codec: C,
    operation_timeout: Duration,
}

impl<T: SessionTransport, S: SessionStore> SessionManager<T, S> {
    /// Creates a manager with the default store call timeout
    /// ([`StoreConfig::default`]'s `operation_timeout`, five seconds).
    ///
    /// The store's own configuration is not consulted; use
    /// [`with_timeout`](Self::with_timeout) or
    /// [`from_config`](SessionManager::from_config) to apply a different bound.
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            codec: JsonCodec,
            operation_timeout: StoreConfig::default().operation_timeout,
        }
    }
}

impl<S: SessionStore> SessionManager<CookieTransport, S> {
    /// Builds a cookie-backed manager from a validated configuration.
    ///
    /// The store is passed in separately; it should have been built from
    /// `config.store` so that record keys and TTLs agree.
    pub fn from_config(config: &SessionConfig, store: S) -> Result<Self, SessionError> {
        config.validate()?;
        let transport =
            CookieTransport::new(config.cookie.clone(), IdGenerator::new(config.id.clone()))?;
        Ok(Self::new(transport, store).with_timeout(config.store.operation_timeout))
    }
}

impl<T, S, C> SessionManager<T, S, C>
where
    T: SessionTransport,
    S: SessionStore,
    C: PayloadCodec,
{
    pub fn with_codec<C2: PayloadCodec>(self, codec: C2) -> SessionManager<T, S, C2> {
        SessionManager {
            transport: self.transport,
            store: self.store,
            codec,
            operation_timeout: self.operation_timeout,
        }
    }

    /// Upper bound for each store call. The request deadline still applies
    /// when it is earlier.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the request's session, issuing or rotating the identifier
    /// when needed.
    ///
    /// Only [`SessionError::NotFound`] from the store leads to rotation. Every
    /// other failure, timeouts and cancellation included, is returned as is.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.load_or_new", skip_all, err)
    )]
    pub async fn load_or_new<P, Req, Res>(
        &self,
        ctx: &RequestContext,
        request: &Req,
        response: &mut Res,
    ) -> Result<SessionLoad<P>, SessionError>
    where
        P: DeserializeOwned,
        Req: CookieSource,
        Res: CookieSink,
    {
        let (id, origin) = self.transport.get_or_issue(request, response)?;

        if origin == IdOrigin::Issued {
            dispatch(SessionEvent::Issued {
                id_prefix: id.log_prefix(),
                at: Utc::now(),
            })
            .await;
        }

        match ctx.run(self.operation_timeout, self.store.load(&id)).await {
            Ok(bytes) => {
                let data = self.codec.decode(&bytes)?;

                dispatch(SessionEvent::Resolved {
                    id_prefix: id.log_prefix(),
                    at: Utc::now(),
                })
                .await;

                Ok(SessionLoad {
                    id,
                    data: Some(data),
                    state: LoadState::Resolved,
                })
            }
            Err(SessionError::NotFound) => {
                let rotated = self.transport.generator().issue()?;

                if origin == IdOrigin::Presented {
                    log::warn!(
                        target: "enclave_session",
                        "msg=\"presented session id not found, rotating\" id_prefix=\"{}\"",
                        id.log_prefix()
                    );
                }

                dispatch(SessionEvent::Rotated {
                    previous_prefix: id.log_prefix(),
                    id_prefix: rotated.log_prefix(),
                    origin,
                    at: Utc::now(),
                })
                .await;

                Ok(SessionLoad {
                    id: rotated,
                    data: None,
                    state: LoadState::Rotated,
                })
            }
            Err(e) => {
                log::error!(
                    target: "enclave_session",
                    "msg=\"session load failed\", operation=\"load_or_new\", error=\"{e}\""
                );
                Err(e)
            }
        }
    }

    /// Persists `payload` under `id`, then writes the binding with a
    /// refreshed lifetime. The binding is not written if the store fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.save", skip_all, err)
    )]
    pub async fn save<P, Res>(
        &self,
        ctx: &RequestContext,
        response: &mut Res,
        id: &SessionId,
        payload: &P,
    ) -> Result<(), SessionError>
    where
        P: Serialize,
        Res: CookieSink,
    {
        let bytes = self.codec.encode(payload)?;

        ctx.run(self.operation_timeout, self.store.save(id, &bytes))
            .await
            .inspect_err(|e| {
                log::error!(
                    target: "enclave_session",
                    "msg=\"session save failed\", operation=\"save\", error=\"{e}\""
                );
            })?;

        self.transport.write(response, id)?;

        dispatch(SessionEvent::Saved {
            id_prefix: id.log_prefix(),
            at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Removes the record for `id` and tells the client to drop its binding.
    ///
    /// Both halves are always attempted. If either fails the error is
    /// [`SessionError::Combined`] with the outcome of each.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.delete", skip_all, err)
    )]
    pub async fn delete<Res>(
        &self,
        ctx: &RequestContext,
        response: &mut Res,
        id: &SessionId,
    ) -> Result<(), SessionError>
    where
        Res: CookieSink,
    {
        let store = ctx
            .run(self.operation_timeout, self.store.delete(id))
            .await
            .err();
        let transport = self.transport.delete(response).err();

        if store.is_some() || transport.is_some() {
            let err = SessionError::Combined {
                store: store.map(Box::new),
                transport: transport.map(Box::new),
            };
            log::error!(
                target: "enclave_session",
                "msg=\"session delete failed\", operation=\"delete\", error=\"{err}\""
            );
            return Err(err);
        }

        dispatch(SessionEvent::Deleted {
            id_prefix: id.log_prefix(),
            at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Releases the store's resources. The manager must not be used afterwards.
    pub async fn close(&self) -> Result<(), SessionError> {
        self.store.close().await
    }
}
