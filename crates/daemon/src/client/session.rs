/// Interactive console driving an [`Invoker`]

use super::input::{letters_only, parse_algo, parse_joke_count, parse_numbers, parse_selection};
use super::render::{render_error, render_result};
use rpcmesh_core::{
    DecodeRequest, EchoRequest, EncodeRequest, EndpointKind, Invoker, JokeRequest,
    JokeSetRequest, Request, SortRequest,
};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Things a user can ask for from the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Echo,
    Joke,
    Brew,
    GetCup,
    BrewStatus,
    Sort,
    Encode,
    Decode,
    History,
    AddJoke,
}

impl Action {
    pub const MENU: [Action; 10] = [
        Action::Echo,
        Action::Joke,
        Action::Brew,
        Action::GetCup,
        Action::BrewStatus,
        Action::Sort,
        Action::Encode,
        Action::Decode,
        Action::History,
        Action::AddJoke,
    ];

    /// 1-based static menu entry
    pub fn from_menu(choice: &str) -> Option<Self> {
        parse_selection(choice, Self::MENU.len()).map(|index| Self::MENU[index])
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Echo => "Echo",
            Action::Joke => "Joke",
            Action::Brew => "Brew Coffee",
            Action::GetCup => "Get Cup",
            Action::BrewStatus => "Brew Status",
            Action::Sort => "Sort",
            Action::Encode => "Vigenere Encode",
            Action::Decode => "Vigenere Decode",
            Action::History => "Vigenere History",
            Action::AddJoke => "Add Joke",
        }
    }

    pub fn endpoint(self) -> EndpointKind {
        match self {
            Action::Echo => EndpointKind::EchoParrot,
            Action::Joke => EndpointKind::JokeGet,
            Action::Brew => EndpointKind::CoffeeBrew,
            Action::GetCup => EndpointKind::CoffeeGetCup,
            Action::BrewStatus => EndpointKind::CoffeeBrewStatus,
            Action::Sort => EndpointKind::SortSort,
            Action::Encode => EndpointKind::VigenereEncode,
            Action::Decode => EndpointKind::VigenereDecode,
            Action::History => EndpointKind::VigenereHistory,
            Action::AddJoke => EndpointKind::JokeSet,
        }
    }

    pub fn from_endpoint(kind: EndpointKind) -> Option<Self> {
        Self::MENU.into_iter().find(|action| action.endpoint() == kind)
    }
}

/// Console session reading answers from `input` and writing to `output`
pub struct ClientSession<R, W> {
    invoker: Invoker,
    message: String,
    input: R,
    output: W,
    closed: bool,
}

impl<R, W> ClientSession<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(invoker: Invoker, message: impl Into<String>, input: R, output: W) -> Self {
        Self {
            invoker,
            message: message.into(),
            input,
            output,
            closed: false,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the menu matching the invoker's resolution until input ends or
    /// the user quits
    pub async fn run(&mut self) -> io::Result<()> {
        if self.invoker.is_dynamic() {
            self.dynamic_flow().await
        } else {
            self.static_menu().await
        }
    }

    async fn say(&mut self, line: &str) -> io::Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Prompt and read one trimmed line; end of input yields an empty answer
    async fn ask(&mut self, prompt: &str) -> io::Result<String> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            self.closed = true;
        }
        Ok(line.trim().to_string())
    }

    fn is_quit(&self, answer: &str) -> bool {
        self.closed || matches!(answer, "q" | "Q" | "quit" | "exit")
    }

    /// Collect the arguments `action` needs. `Ok(Err(_))` is a validation
    /// failure to show the user.
    async fn build_request(&mut self, action: Action) -> io::Result<Result<Request, String>> {
        let request = match action {
            Action::Echo => Ok(Request::Parrot(EchoRequest {
                message: self.message.clone(),
            })),
            Action::Joke => {
                let answer = self.ask("How many jokes? ").await?;
                parse_joke_count(&answer).map(|number| Request::GetJoke(JokeRequest { number }))
            }
            Action::AddJoke => {
                let joke = self.ask("Enter joke: ").await?;
                if joke.is_empty() {
                    Err("Joke cannot be empty.".to_string())
                } else {
                    Ok(Request::SetJoke(JokeSetRequest { joke }))
                }
            }
            Action::Brew => Ok(Request::Brew),
            Action::GetCup => Ok(Request::GetCup),
            Action::BrewStatus => Ok(Request::BrewStatus),
            Action::Sort => {
                let numbers = self.ask("Enter numbers (comma-separated): ").await?;
                match parse_numbers(&numbers) {
                    Ok(data) => {
                        let algo = self.ask("Choose algo (0=MERGE,1=QUICK,2=INTERN): ").await?;
                        parse_algo(&algo).map(|algo| {
                            Request::Sort(SortRequest {
                                data,
                                algo: Some(algo),
                            })
                        })
                    }
                    Err(err) => Err(err),
                }
            }
            Action::Encode => {
                let plaintext = self.ask("Enter plaintext: ").await?;
                let key = self.ask("Enter key: ").await?;
                letters_only("Plaintext", &plaintext).and_then(|plaintext| {
                    letters_only("Key", &key)
                        .map(|key| Request::Encode(EncodeRequest { plaintext, key }))
                })
            }
            Action::Decode => {
                let ciphertext = self.ask("Enter ciphertext: ").await?;
                let key = self.ask("Enter key: ").await?;
                letters_only("Ciphertext", &ciphertext).and_then(|ciphertext| {
                    letters_only("Key", &key)
                        .map(|key| Request::Decode(DecodeRequest { ciphertext, key }))
                })
            }
            Action::History => Ok(Request::History),
        };
        Ok(request)
    }

    /// Perform one action and print a one-line outcome
    pub async fn run_action(&mut self, action: Action) -> io::Result<()> {
        let request = match self.build_request(action).await? {
            Ok(request) => request,
            Err(reason) => return self.say(&reason).await,
        };

        debug!("Calling {}", action.endpoint());
        let result = self
            .invoker
            .invoke(action.endpoint().full_name(), request)
            .await;
        self.say(&render_result(&result)).await
    }

    /// Numbered menu against a fixed node
    pub async fn static_menu(&mut self) -> io::Result<()> {
        loop {
            self.say("").await?;
            for (index, action) in Action::MENU.iter().enumerate() {
                self.say(&format!("{}) {}", index + 1, action.label())).await?;
            }
            self.say("q) Quit").await?;

            let choice = self.ask("Choose an option: ").await?;
            if self.is_quit(&choice) {
                return Ok(());
            }

            match Action::from_menu(&choice) {
                Some(action) => self.run_action(action).await?,
                None => self.say(&format!("Invalid choice: {choice}")).await?,
            }
        }
    }

    /// True when the user wants to ask the registry again
    async fn retry_or_quit(&mut self) -> io::Result<bool> {
        let answer = self.ask("Press Enter to retry, or q to quit: ").await?;
        Ok(!self.is_quit(&answer))
    }

    /// List registered endpoints, let the user pick one, resolve and call it
    pub async fn dynamic_flow(&mut self) -> io::Result<()> {
        loop {
            let names = match self.invoker.list_endpoints().await {
                Ok(names) if !names.is_empty() => names,
                Ok(_) => {
                    self.say("No services registered.").await?;
                    if self.retry_or_quit().await? {
                        continue;
                    }
                    return Ok(());
                }
                Err(err) => {
                    self.say(&render_error(&err)).await?;
                    if self.retry_or_quit().await? {
                        continue;
                    }
                    return Ok(());
                }
            };

            self.say("").await?;
            self.say("Registered services:").await?;
            for (index, name) in names.iter().enumerate() {
                self.say(&format!("{}) {}", index + 1, name)).await?;
            }

            let choice = self.ask("Select a service by number: ").await?;
            if self.is_quit(&choice) {
                return Ok(());
            }
            let Some(index) = parse_selection(&choice, names.len()) else {
                self.say("Invalid selection.").await?;
                continue;
            };

            let name = &names[index];
            match EndpointKind::from_name(name.as_str()).and_then(Action::from_endpoint) {
                Some(action) => self.run_action(action).await?,
                None => {
                    let line = format!("Unknown method: {}", name.method());
                    self.say(&line).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcmesh_common::{Connection, NodeConfig};
    use rpcmesh_core::{
        CallOptions, Listener, ListenerConfig, MessageDispatcher, Node, RegistryService, Server,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::sync::watch;

    fn options() -> CallOptions {
        CallOptions {
            connect_timeout: Duration::from_secs(2),
            call_timeout: Duration::from_secs(2),
        }
    }

    async fn start_node() -> (Connection, watch::Sender<bool>) {
        let config = NodeConfig::new()
            .with_name("console")
            .with_listen("127.0.0.1", 0)
            .with_advertise_host("127.0.0.1")
            .with_shutdown_grace(Duration::from_secs(1));
        let node = Node::bind(config).await.unwrap();
        let target = node.advertised().clone();
        let (stop, rx) = watch::channel(false);
        tokio::spawn(node.run(rx));
        (target, stop)
    }

    async fn run_script(invoker: Invoker, script: &str) -> String {
        let input = BufReader::new(script.as_bytes());
        let mut session = ClientSession::new(invoker, "Hello", input, Vec::new());
        session.run().await.unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    #[test]
    fn test_menu_mapping() {
        assert_eq!(Action::from_menu("1"), Some(Action::Echo));
        assert_eq!(Action::from_menu("9"), Some(Action::History));
        assert_eq!(Action::from_menu("11"), None);
        assert_eq!(
            Action::from_endpoint(EndpointKind::CoffeeGetCup),
            Some(Action::GetCup)
        );
        assert_eq!(Action::from_endpoint(EndpointKind::CatalogList), None);
    }

    #[tokio::test]
    async fn test_static_menu_script() {
        let (target, stop) = start_node().await;
        let invoker = Invoker::static_node(target, options());

        let script = "1\n6\n5,3,7,1\n1\n7\nHELLO\nKEY\n7\nHELLO1\nKEY\n42\nq\n";
        let output = run_script(invoker, script).await;

        assert!(output.contains("Echo: Hello"), "{output}");
        assert!(output.contains("Sorted: [1, 3, 5, 7]"), "{output}");
        assert!(output.contains("Result: RIJVS"), "{output}");
        assert!(output.contains("Plaintext must only contain letters."), "{output}");
        assert!(output.contains("Invalid choice: 42"), "{output}");

        stop.send(true).unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_node_does_not_end_session() {
        let invoker = Invoker::static_node(Connection::new("127.0.0.1", 1), options());
        let output = run_script(invoker, "3\n4\n").await;

        assert_eq!(output.matches("Could not reach 127.0.0.1:1").count(), 2, "{output}");
    }

    #[tokio::test]
    async fn test_dynamic_flow_with_dead_registry() {
        let invoker = Invoker::dynamic(Connection::new("127.0.0.1", 1), options());
        let output = run_script(invoker, "1\n1\n1\nq\n").await;

        assert_eq!(output.matches("Could not reach 127.0.0.1:1").count(), 4, "{output}");
    }

    #[tokio::test]
    async fn test_dynamic_flow_with_empty_registry() {
        let registry = RegistryService::default();
        let mut dispatcher = MessageDispatcher::new();
        dispatcher.attach(Arc::new(registry)).unwrap();
        let listener = Listener::bind(ListenerConfig::default()).await.unwrap();
        let port = listener.local_addr().port();
        let server = Server::new(listener, Arc::new(dispatcher), 4, Duration::from_secs(1));
        let (stop, rx) = watch::channel(false);
        tokio::spawn(server.run(rx));

        let invoker = Invoker::dynamic(Connection::new("127.0.0.1", port), options());
        let output = run_script(invoker, "\nq\n").await;
        assert_eq!(output.matches("No services registered.").count(), 2, "{output}");

        stop.send(true).unwrap();
    }
}
