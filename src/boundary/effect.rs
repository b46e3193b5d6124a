//! Effect-based entry point.
//!
//! Wraps a service call in a Stillwater effect so it can be composed with
//! other effects and run against an injected environment. The pure engine
//! stays at the core; the effect is the imperative shell around it.

use super::authorization::AccessToken;
use super::service::{DealService, DealTransitioned, ServiceError};
use crate::core::{DealEvent, DealId};
use stillwater::effect::BoxedEffect;
use stillwater::prelude::*;

/// Environment able to provide a deal service.
pub trait DealEnv {
    fn deal_service(&self) -> &DealService;
}

impl DealEnv for DealService {
    fn deal_service(&self) -> &DealService {
        self
    }
}

/// Effect that applies `event` to the stored deal when run.
pub fn transition_effect<Env>(
    deal_id: DealId,
    token: AccessToken,
    event: DealEvent,
) -> BoxedEffect<DealTransitioned, ServiceError, Env>
where
    Env: DealEnv + Clone + Send + Sync + 'static,
{
    from_fn(move |env: &Env| {
        env.deal_service()
            .transition(&deal_id, &token, event.clone())
    })
    .boxed()
}
