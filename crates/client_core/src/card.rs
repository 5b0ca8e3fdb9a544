//! Inventory card flow.

use std::sync::Arc;

use floor_shared::domain::{next_position_number, CardNumber, CardPosition, CardSummary, SelectOption};
use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::{
    cache::{FetchFuture, QueryCache, QueryOptions, QueryState, Subscription},
    context::{FloorContext, RefreshPolicy},
    dialog::ConfirmDialog,
    error::{ClientResult, ValidationError},
    events::FloorEvent,
    gateway::ActionGateway,
    screen::{select_card_state, CardState, CardView},
    validation::NewCardForm,
};

pub type PositionsKey = (Vec<String>, CardNumber);

#[derive(Clone)]
pub struct CardCaches {
    pub cards: QueryCache<Vec<String>, Vec<CardSummary>>,
    pub positions: QueryCache<PositionsKey, Vec<CardPosition>>,
}

impl CardCaches {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            cards: QueryCache::new("cards", QueryOptions::cached(policy.cards_stale)),
            positions: QueryCache::new("card-positions", QueryOptions::cached(policy.cards_stale)),
        }
    }
}

/// Radio-group choices for a new card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardOptions {
    pub warehouses: Vec<SelectOption>,
    pub sectors: Vec<SelectOption>,
}

pub struct CardFlow {
    ctx: Arc<FloorContext>,
    caches: CardCaches,
    cards: Subscription<Vec<String>, Vec<CardSummary>>,
    positions: Subscription<PositionsKey, Vec<CardPosition>>,
    options: Option<CardOptions>,
}

impl CardFlow {
    pub fn new(ctx: Arc<FloorContext>) -> Self {
        let caches = CardCaches::new(ctx.policy());
        Self::with_caches(ctx, caches)
    }

    pub fn with_caches(ctx: Arc<FloorContext>, caches: CardCaches) -> Self {
        let cards = caches.cards.subscribe(None, cards_fetcher(ctx.gateway()));
        let positions = caches
            .positions
            .subscribe(None, positions_fetcher(ctx.gateway()));
        Self {
            ctx,
            caches,
            cards,
            positions,
            options: None,
        }
    }

    pub fn context(&self) -> &Arc<FloorContext> {
        &self.ctx
    }

    pub fn evaluate(&mut self) -> CardState {
        self.sync_subscriptions();
        let mut selection = self.ctx.selection().card();

        if let Some(card) = selection.as_mut() {
            let positions = self.positions.data();
            if card.position.is_none() && positions.is_some_and(|positions| positions.is_empty()) {
                debug!(card = %card.card, "card has no positions; opening position 1");
                self.ctx.selection().select_position(1);
                card.position = Some(1);
            }
        }

        select_card_state(&CardView {
            logged_in: self.ctx.session().is_logged_in(),
            card: selection.as_ref().map(|card| card.card),
            position: selection.as_ref().and_then(|card| card.position),
        })
    }

    fn sync_subscriptions(&mut self) {
        let persons = self.ctx.session().is_logged_in().then(|| self.ctx.session().identifiers());

        if self.cards.key() != persons.as_ref() {
            self.cards = self
                .caches
                .cards
                .subscribe(persons.clone(), cards_fetcher(self.ctx.gateway()));
        }

        let positions_key = persons.zip(self.ctx.selection().card().map(|card| card.card));
        if self.positions.key() != positions_key.as_ref() {
            self.positions = self
                .caches
                .positions
                .subscribe(positions_key, positions_fetcher(self.ctx.gateway()));
        }
    }

    pub fn cards(&self) -> QueryState<Vec<CardSummary>> {
        self.cards.state()
    }

    pub fn positions(&self) -> QueryState<Vec<CardPosition>> {
        self.positions.state()
    }

    pub async fn refetch_cards(&self) -> QueryState<Vec<CardSummary>> {
        self.cards.refetch().await
    }

    pub async fn refetch_positions(&self) -> QueryState<Vec<CardPosition>> {
        self.positions.refetch().await
    }

    pub fn options(&self) -> Option<&CardOptions> {
        self.options.as_ref()
    }

    /// Loads both option lists for the new-card form. A failure raises the
    /// configuration-error toast and leaves the form without choices.
    pub async fn load_options(&mut self) -> ClientResult<&CardOptions> {
        let gateway = Arc::clone(self.ctx.gateway());
        let loaded = futures::try_join!(
            gateway.fetch_warehouse_options(),
            gateway.fetch_sector_options()
        );
        match loaded {
            Ok((warehouses, sectors)) => {
                debug!(
                    warehouses = warehouses.len(),
                    sectors = sectors.len(),
                    "card options loaded"
                );
                Ok(&*self.options.insert(CardOptions { warehouses, sectors }))
            }
            Err(err) => {
                warn!(error = %err, "failed to load card options");
                self.ctx
                    .emit(FloorEvent::error(self.ctx.dictionary().inventory.config_error.clone()));
                Err(err)
            }
        }
    }

    /// Validates the form against the loaded options and creates the card.
    /// On success the new card becomes the selection; on failure the
    /// selection is untouched and a toast explains why.
    pub async fn create_card(&mut self, form: &NewCardForm) -> ClientResult<CardNumber> {
        if !self.ctx.session().is_logged_in() {
            return Err(ValidationError::NotLoggedIn.into());
        }
        let options = self.options.clone().unwrap_or_default();
        let valid = form.validate(&options.warehouses, &options.sectors)?;

        let persons = self.ctx.session().identifiers();
        let created = self
            .ctx
            .gateway()
            .create_new_card(persons.clone(), valid.warehouse.clone(), valid.sector.clone())
            .await;
        match created {
            Ok(card) => {
                info!(%card, warehouse = %valid.warehouse, sector = %valid.sector, "card created");
                self.ctx.selection().select_card(card, valid.warehouse, valid.sector);
                self.caches.cards.invalidate(&persons);
                self.ctx.emit(FloorEvent::CardAdopted(card));
                Ok(card)
            }
            Err(err) => {
                let table = &self.ctx.dictionary().errors.create_card;
                self.ctx.report_failure("create_new_card", table, &err);
                Err(err)
            }
        }
    }

    /// Picks an existing card from the list.
    pub fn choose_card(&self, card: &CardSummary) {
        self.ctx
            .selection()
            .select_card(card.number, card.warehouse.clone(), card.sector.clone());
    }

    pub fn select_position(&self, position: u32) {
        self.ctx.selection().select_position(position);
    }

    /// Opens the next free position number on the selected card.
    pub fn new_position(&self) -> Option<u32> {
        self.ctx.selection().card()?;
        let next = self
            .positions
            .data()
            .map_or(1, |positions| next_position_number(&positions));
        self.ctx.selection().select_position(next);
        Some(next)
    }

    pub fn back_to_positions(&self) {
        self.ctx.selection().clear_position();
    }

    pub fn leave_card(&self) {
        self.ctx.selection().clear_card();
    }

    pub async fn delete_position(&self, position: u32) -> bool {
        let Some(selection) = self.ctx.selection().card() else {
            warn!(position, "delete position without a selected card");
            return false;
        };
        let persons = self.ctx.session().identifiers();
        let result = self
            .ctx
            .gateway()
            .delete_card_position(persons.clone(), selection.card, position)
            .await;
        match result {
            Ok(()) => {
                info!(card = %selection.card, position, "card position deleted");
                if selection.position == Some(position) {
                    self.ctx.selection().clear_position();
                }
                self.caches.positions.invalidate(&(persons, selection.card));
                true
            }
            Err(err) => {
                let table = &self.ctx.dictionary().errors.delete;
                self.ctx.report_failure("delete_card_position", table, &err);
                false
            }
        }
    }

    pub async fn confirm_delete(&self, dialog: &mut ConfirmDialog, position: u32) -> bool {
        dialog.confirm(|| self.delete_position(position)).await
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        let result = self.ctx.logout();
        self.sync_subscriptions();
        result
    }

    /// Localized text for a failed cards or positions fetch. Cached data
    /// stays on screen next to it; a refetch clears it.
    pub fn fetch_error_message(&self) -> Option<String> {
        let err = self.cards.error().or_else(|| self.positions.error())?;
        Some(self.ctx.dictionary().errors.fetch.message(&err))
    }
}

fn cards_fetcher(
    gateway: &Arc<dyn ActionGateway>,
) -> impl Fn(Vec<String>) -> FetchFuture<Vec<CardSummary>> + Send + Sync + 'static {
    let gateway = Arc::clone(gateway);
    move |persons| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_cards(persons).await }.boxed()
    }
}

fn positions_fetcher(
    gateway: &Arc<dyn ActionGateway>,
) -> impl Fn(PositionsKey) -> FetchFuture<Vec<CardPosition>> + Send + Sync + 'static {
    let gateway = Arc::clone(gateway);
    move |(persons, card)| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_card_positions(persons, card).await }.boxed()
    }
}

#[cfg(test)]
#[path = "tests/card_tests.rs"]
mod tests;
