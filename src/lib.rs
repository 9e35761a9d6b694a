pub mod config;
#[cfg(target_arch = "wasm32")]
pub mod dom;
pub mod domain;
#[cfg(target_arch = "wasm32")]
pub mod eip1193;
pub mod event;
#[cfg(target_arch = "wasm32")]
pub mod page;
pub mod provider;
pub mod view;

use std::cell::RefCell;

use log::{debug, warn};

use self::{
    config::Config,
    domain::{Address, ChainId, Wei},
    event::Event,
    provider::{Provider, ProviderError},
    view::{Tone, View, PLACEHOLDER},
};

const STATUS_DISCONNECTED: &str = "Disconnected";
const STATUS_CONNECTING: &str = "Connecting...";
const STATUS_CONNECTED: &str = "Connected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connecting,
    Connected,
    WrongNetwork(ChainId),
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No injected wallet provider is available")]
    ProviderUnavailable,

    #[error("The user rejected the connection request")]
    UserRejected,

    #[error("The wallet returned no authorized accounts")]
    NoAccounts,

    #[error(transparent)]
    Request(ProviderError),
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::Request(err)
        }
    }
}

/// The last values received from the provider. Cleared wholesale whenever
/// the session they belong to ends.
#[derive(Debug, Default)]
struct Session {
    address: Option<Address>,
    chain: Option<ChainId>,
    balance: Option<Wei>,
}

/// Connection controller for one page and one injected wallet.
///
/// All mutable state sits behind `RefCell` so that provider notifications
/// can interleave with an in-flight [`connect`](Self::connect); no borrow is
/// ever held across an await point. Execution is single-threaded and
/// cooperative, so last-write-wins is the whole story.
pub struct WalletConnection<P, V> {
    provider: P,
    config: Config,
    view: RefCell<V>,
    state: RefCell<State>,
    session: RefCell<Session>,
}

impl<P: Provider, V: View> WalletConnection<P, V> {
    pub fn new(provider: P, view: V, config: Config) -> Self {
        let this = Self {
            provider,
            config,
            view: RefCell::new(view),
            state: RefCell::new(State::Disconnected),
            session: RefCell::new(Session::default()),
        };
        this.render();
        this
    }

    pub fn state(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drives the whole connection sequence: authorization, network check,
    /// balance fetch. May suspend indefinitely while the wallet waits for
    /// the user.
    ///
    /// Without a provider this refuses up front with a blocking notice and
    /// leaves the state untouched. Any provider failure ends in
    /// [`State::Failed`], which the user can retry from.
    pub async fn connect(&self) -> Result<(), Error> {
        if !self.provider.is_available() {
            self.view.borrow_mut().notice(&self.config.install_prompt);
            return Err(Error::ProviderUnavailable);
        }

        self.transition(State::Connecting);
        match self.establish().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Wallet connection failed: {err}");
                {
                    let mut session = self.session.borrow_mut();
                    session.chain = None;
                    session.balance = None;
                }
                self.transition(State::Failed);
                Err(err)
            }
        }
    }

    async fn establish(&self) -> Result<(), Error> {
        let accounts = self.provider.request_accounts().await?;
        let address = accounts.into_iter().next().ok_or(Error::NoAccounts)?;
        self.session.borrow_mut().address = Some(address.clone());
        self.render();

        let chain = self.provider.chain_id().await?;
        self.session.borrow_mut().chain = Some(chain);
        if chain != self.config.expected_chain {
            debug!("Connected to {chain}, expected {}", self.config.expected_chain);
            self.transition(State::WrongNetwork(chain));
            return Ok(());
        }

        self.transition(State::Connected);
        let balance = self.provider.balance(&address).await?;
        self.session.borrow_mut().balance = Some(balance);
        self.render();
        Ok(())
    }

    /// Provider notification: the authorized account set changed.
    ///
    /// An empty set is a full disconnect. A non-empty set only swaps the
    /// displayed address, mirroring the page this controller grew out of.
    // TODO: re-fetch the balance for the new account; until then the
    // previous account's balance stays on screen until the next connect or
    // chain switch.
    pub fn accounts_changed(&self, accounts: Vec<Address>) {
        match accounts.into_iter().next() {
            None => {
                debug!("Provider reported an empty account set, disconnecting");
                self.reset();
            }
            Some(address) => {
                self.session.borrow_mut().address = Some(address);
                self.render();
            }
        }
    }

    /// Provider notification: the wallet switched chains. Everything shown
    /// so far belongs to the old chain, so the controller starts over.
    pub fn chain_changed(&self) {
        debug!("Chain changed, discarding session state");
        self.reset();
    }

    pub fn handle(&self, event: Event) {
        match event {
            Event::AccountsChanged(accounts) => self.accounts_changed(accounts),
            Event::ChainChanged => self.chain_changed(),
        }
    }

    fn reset(&self) {
        *self.session.borrow_mut() = Session::default();
        self.transition(State::Disconnected);
    }

    fn transition(&self, next: State) {
        {
            let mut state = self.state.borrow_mut();
            debug!("State {:?} -> {next:?}", *state);
            *state = next;
        }
        self.render();
    }

    /// Rewrites all five view regions from the current state and the last
    /// provider values. Called on every transition so no region can go
    /// stale.
    fn render(&self) {
        let state = self.state.borrow().clone();
        let session = self.session.borrow();
        let address = session
            .address
            .as_ref()
            .map(Address::shortened)
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let balance =
            session.balance.map(|b| b.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string());
        drop(session);

        let mut view = self.view.borrow_mut();
        match state {
            State::Disconnected => {
                view.set_status(STATUS_DISCONNECTED, Tone::Err);
                view.set_address(PLACEHOLDER);
                view.set_network(PLACEHOLDER);
                view.set_balance(PLACEHOLDER);
                view.set_connect(true, &self.config.connect_label);
            }
            State::Connecting => {
                view.set_status(STATUS_CONNECTING, Tone::Pending);
                view.set_address(&address);
                view.set_network(PLACEHOLDER);
                view.set_balance(PLACEHOLDER);
                view.set_connect(true, &self.config.connect_label);
            }
            State::WrongNetwork(_) => {
                view.set_status(&self.config.switch_prompt, Tone::Err);
                view.set_address(&address);
                view.set_network(&self.config.wrong_network_text);
                view.set_balance(PLACEHOLDER);
                view.set_connect(true, &self.config.connect_label);
            }
            State::Connected => {
                view.set_status(STATUS_CONNECTED, Tone::Ok);
                view.set_address(&address);
                view.set_network(&self.config.network_label);
                view.set_balance(&balance);
                view.set_connect(false, &self.config.connected_label);
            }
            State::Failed => {
                view.set_status(&self.config.failure_text, Tone::Err);
                view.set_address(&address);
                view.set_network(PLACEHOLDER);
                view.set_balance(PLACEHOLDER);
                view.set_connect(true, &self.config.connect_label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use async_trait::async_trait;
    use futures::executor::block_on;

    use super::*;

    #[derive(Clone)]
    struct MockProvider {
        available: bool,
        accounts: Rc<RefCell<Result<Vec<Address>, ProviderError>>>,
        chain: Rc<RefCell<Result<ChainId, ProviderError>>>,
        balance: Rc<RefCell<Result<Wei, ProviderError>>>,
        balance_calls: Rc<Cell<usize>>,
    }

    impl MockProvider {
        fn happy() -> Self {
            Self {
                available: true,
                accounts: Rc::new(RefCell::new(Ok(vec![first_account()]))),
                chain: Rc::new(RefCell::new(Ok(ChainId(0xa869)))),
                balance: Rc::new(RefCell::new(Ok(Wei(1_000_000_000_000_000_000)))),
                balance_calls: Rc::new(Cell::new(0)),
            }
        }

        fn absent() -> Self {
            let mut this = Self::happy();
            this.available = false;
            this
        }
    }

    #[async_trait(?Send)]
    impl Provider for MockProvider {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.accounts.borrow().clone()
        }

        async fn chain_id(&self) -> Result<ChainId, ProviderError> {
            self.chain.borrow().clone()
        }

        async fn balance(&self, _address: &Address) -> Result<Wei, ProviderError> {
            self.balance_calls.set(self.balance_calls.get() + 1);
            self.balance.borrow().clone()
        }
    }

    #[derive(Default)]
    struct Panel {
        status: String,
        tone: Tone,
        address: String,
        network: String,
        balance: String,
        connect_enabled: bool,
        connect_label: String,
        notices: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct RecordingView(Rc<RefCell<Panel>>);

    impl View for RecordingView {
        fn set_status(&mut self, text: &str, tone: Tone) {
            let mut panel = self.0.borrow_mut();
            panel.status = text.to_string();
            panel.tone = tone;
        }

        fn set_address(&mut self, text: &str) {
            self.0.borrow_mut().address = text.to_string();
        }

        fn set_network(&mut self, text: &str) {
            self.0.borrow_mut().network = text.to_string();
        }

        fn set_balance(&mut self, text: &str) {
            self.0.borrow_mut().balance = text.to_string();
        }

        fn set_connect(&mut self, enabled: bool, label: &str) {
            let mut panel = self.0.borrow_mut();
            panel.connect_enabled = enabled;
            panel.connect_label = label.to_string();
        }

        fn notice(&mut self, text: &str) {
            self.0.borrow_mut().notices.push(text.to_string());
        }
    }

    fn first_account() -> Address {
        "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap()
    }

    fn second_account() -> Address {
        "0xab5801a7d398351b8be11c439e05c5b3259aec9b".parse().unwrap()
    }

    fn controller(
        provider: MockProvider,
    ) -> (WalletConnection<MockProvider, RecordingView>, RecordingView) {
        let view = RecordingView::default();
        (WalletConnection::new(provider, view.clone(), Config::default()), view)
    }

    #[test]
    fn fresh_controller_renders_disconnected() {
        let (wallet, view) = controller(MockProvider::happy());
        assert_eq!(wallet.state(), State::Disconnected);

        let panel = view.0.borrow();
        assert_eq!(panel.status, STATUS_DISCONNECTED);
        assert_eq!(panel.address, PLACEHOLDER);
        assert_eq!(panel.network, PLACEHOLDER);
        assert_eq!(panel.balance, PLACEHOLDER);
        assert!(panel.connect_enabled);
        assert_eq!(panel.connect_label, "Connect Wallet");
    }

    #[test]
    fn connect_ends_in_connected_on_the_right_network() {
        let (wallet, view) = controller(MockProvider::happy());
        block_on(wallet.connect()).unwrap();

        assert_eq!(wallet.state(), State::Connected);
        let panel = view.0.borrow();
        assert_eq!(panel.status, STATUS_CONNECTED);
        assert_eq!(panel.tone, Tone::Ok);
        assert_eq!(panel.address, "0xd8da...6045");
        assert_eq!(panel.network, "Avalanche Fuji Testnet");
        assert_eq!(panel.balance, "1.0000");
        assert!(!panel.connect_enabled);
        assert_eq!(panel.connect_label, "Connected");
    }

    #[test]
    fn connect_without_a_provider_changes_nothing() {
        let (wallet, view) = controller(MockProvider::absent());
        let err = block_on(wallet.connect()).unwrap_err();

        assert!(matches!(err, Error::ProviderUnavailable));
        assert_eq!(wallet.state(), State::Disconnected);
        let panel = view.0.borrow();
        assert_eq!(panel.status, STATUS_DISCONNECTED);
        assert_eq!(panel.notices.len(), 1);
    }

    #[test]
    fn wrong_network_never_fetches_the_balance() {
        let provider = MockProvider::happy();
        *provider.chain.borrow_mut() = Ok(ChainId(1));
        let calls = Rc::clone(&provider.balance_calls);
        let (wallet, view) = controller(provider);

        block_on(wallet.connect()).unwrap();

        assert_eq!(wallet.state(), State::WrongNetwork(ChainId(1)));
        assert_eq!(calls.get(), 0);
        let panel = view.0.borrow();
        assert_eq!(panel.balance, PLACEHOLDER);
        assert_eq!(panel.network, "Wrong Network");
        assert_eq!(panel.status, "Please switch to Avalanche Fuji Testnet");
        assert_eq!(panel.tone, Tone::Err);
        assert!(panel.connect_enabled);
    }

    #[test]
    fn user_rejection_ends_in_failed_without_stale_connecting_text() {
        let provider = MockProvider::happy();
        *provider.accounts.borrow_mut() = Err(ProviderError::new(4001, "User rejected"));
        let (wallet, view) = controller(provider);

        let err = block_on(wallet.connect()).unwrap_err();

        assert!(matches!(err, Error::UserRejected));
        assert_eq!(wallet.state(), State::Failed);
        let panel = view.0.borrow();
        assert_eq!(panel.status, "Connection Failed");
        assert_eq!(panel.tone, Tone::Err);
        assert_eq!(panel.balance, PLACEHOLDER);
    }

    #[test]
    fn empty_authorized_account_list_fails() {
        let provider = MockProvider::happy();
        *provider.accounts.borrow_mut() = Ok(vec![]);
        let (wallet, _view) = controller(provider);

        let err = block_on(wallet.connect()).unwrap_err();
        assert!(matches!(err, Error::NoAccounts));
        assert_eq!(wallet.state(), State::Failed);
    }

    #[test]
    fn failed_connection_can_be_retried() {
        let provider = MockProvider::happy();
        *provider.accounts.borrow_mut() = Err(ProviderError::new(-32603, "boom"));
        let accounts = Rc::clone(&provider.accounts);
        let (wallet, _view) = controller(provider);

        assert!(block_on(wallet.connect()).is_err());
        assert_eq!(wallet.state(), State::Failed);

        *accounts.borrow_mut() = Ok(vec![first_account()]);
        block_on(wallet.connect()).unwrap();
        assert_eq!(wallet.state(), State::Connected);
    }

    #[test]
    fn empty_accounts_notification_resets_everything() {
        let (wallet, view) = controller(MockProvider::happy());
        block_on(wallet.connect()).unwrap();

        wallet.handle(Event::AccountsChanged(vec![]));

        assert_eq!(wallet.state(), State::Disconnected);
        let panel = view.0.borrow();
        assert_eq!(panel.status, STATUS_DISCONNECTED);
        assert_eq!(panel.address, PLACEHOLDER);
        assert_eq!(panel.network, PLACEHOLDER);
        assert_eq!(panel.balance, PLACEHOLDER);
        assert!(panel.connect_enabled);
        assert_eq!(panel.connect_label, "Connect Wallet");
    }

    // Pins the observed upstream behavior: switching accounts swaps the
    // address but keeps the old account's balance on screen.
    #[test]
    fn account_switch_updates_address_but_keeps_stale_balance() {
        let provider = MockProvider::happy();
        let calls = Rc::clone(&provider.balance_calls);
        let (wallet, view) = controller(provider);
        block_on(wallet.connect()).unwrap();

        wallet.accounts_changed(vec![second_account()]);

        assert_eq!(wallet.state(), State::Connected);
        assert_eq!(calls.get(), 1);
        let panel = view.0.borrow();
        assert_eq!(panel.address, "0xab58...ec9b");
        assert_eq!(panel.balance, "1.0000");
    }

    #[test]
    fn chain_change_discards_all_displayed_values() {
        let (wallet, view) = controller(MockProvider::happy());
        block_on(wallet.connect()).unwrap();

        wallet.handle(Event::ChainChanged);

        assert_eq!(wallet.state(), State::Disconnected);
        let panel = view.0.borrow();
        assert_eq!(panel.address, PLACEHOLDER);
        assert_eq!(panel.network, PLACEHOLDER);
        assert_eq!(panel.balance, PLACEHOLDER);
        assert!(panel.connect_enabled);
    }
}
