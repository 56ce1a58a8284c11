//! Alarm command implementation.
//!
//! Handles `alarm arm`, `alarm disarm` and `alarm list`. Each operation
//! validates its arguments, acquires a request context, calls the cluster,
//! releases the context, and renders the response. Argument problems are
//! reported as [`CommandError::BadArgs`] before any cluster call is made.

use std::io::Write;

use alarm_proto::{AlarmMember, AlarmResponse, AlarmType};
use tracing::debug;

use crate::cli::AlarmCommands;
use crate::client::AlarmClient;
use crate::context::ContextSource;
use crate::error::CommandError;
use crate::output::OutputFormat;

/// Handler for alarm subcommands.
pub struct AlarmCommand<'a, C> {
    client: &'a mut C,
    contexts: &'a ContextSource,
}

impl<'a, C: AlarmClient> AlarmCommand<'a, C> {
    /// Creates a new alarm command handler.
    #[must_use]
    pub fn new(client: &'a mut C, contexts: &'a ContextSource) -> Self {
        Self { client, contexts }
    }

    /// Executes the alarm subcommand.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::BadArgs`] for malformed arguments and
    /// [`CommandError::Operation`] if the cluster call fails.
    pub async fn execute<W: Write>(
        &mut self,
        out: &mut W,
        format: &OutputFormat,
        command: &AlarmCommands,
    ) -> Result<(), CommandError> {
        match command {
            AlarmCommands::Arm { args } => self.arm(out, format, args).await,
            AlarmCommands::Disarm { args } => self.disarm(out, format, args).await,
            AlarmCommands::List { args } => self.list(out, format, args).await,
        }
    }

    /// Arms the alarm named by `<memberID> <alarmType>`.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn arm<W: Write>(
        &mut self,
        out: &mut W,
        format: &OutputFormat,
        args: &[String],
    ) -> Result<(), CommandError> {
        let member = validate_arm(args)?;
        debug!(member_id = member.member_id, alarm = %member.alarm, "arming alarm");

        let ctx = self.contexts.acquire();
        let result = self.client.arm_alarm(&ctx, member).await;
        drop(ctx);

        render(out, format, &result?)
    }

    /// Disarms every active alarm.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn disarm<W: Write>(
        &mut self,
        out: &mut W,
        format: &OutputFormat,
        args: &[String],
    ) -> Result<(), CommandError> {
        validate_no_args("disarm", args)?;
        debug!("disarming all alarms");

        let ctx = self.contexts.acquire();
        let result = self.client.disarm_alarm(&ctx, AlarmMember::default()).await;
        drop(ctx);

        render(out, format, &result?)
    }

    /// Lists active alarms.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub async fn list<W: Write>(
        &mut self,
        out: &mut W,
        format: &OutputFormat,
        args: &[String],
    ) -> Result<(), CommandError> {
        validate_no_args("list", args)?;
        debug!("listing alarms");

        let ctx = self.contexts.acquire();
        let result = self.client.list_alarms(&ctx).await;
        drop(ctx);

        render(out, format, &result?)
    }
}

fn render<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    response: &AlarmResponse,
) -> Result<(), CommandError> {
    debug!(alarms = response.alarms.len(), "rendering response");
    format.write(out, response)
}

/// Checks `alarm arm` arguments and builds the member to arm.
///
/// # Errors
///
/// Returns [`CommandError::BadArgs`] unless there are exactly two arguments,
/// the first a base-16 member ID and the second a known alarm type.
pub fn validate_arm(args: &[String]) -> Result<AlarmMember, CommandError> {
    let [member_id, alarm] = args else {
        debug!(count = args.len(), "alarm arm: wrong argument count");
        return Err(CommandError::BadArgs(
            "alarm arm requires two arguments: member id and alarm type".into(),
        ));
    };

    let member_id = parse_member_id(member_id)?;
    let alarm = parse_alarm_type(alarm)?;
    Ok(AlarmMember::new(member_id, alarm))
}

/// Checks that a subcommand received no arguments.
///
/// # Errors
///
/// Returns [`CommandError::BadArgs`] if `args` is not empty.
pub fn validate_no_args(subcommand: &str, args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() {
        return Ok(());
    }
    debug!(subcommand, count = args.len(), "unexpected arguments");
    Err(CommandError::BadArgs(format!(
        "alarm {subcommand} command accepts no arguments"
    )))
}

/// Parses a member ID written in base 16.
///
/// The whole token must be hex digits: no sign, no `0x` prefix.
///
/// # Errors
///
/// Returns [`CommandError::BadArgs`] if the token is not a base-16 `u64`.
pub fn parse_member_id(token: &str) -> Result<u64, CommandError> {
    let invalid = || {
        debug!(token, "invalid member id");
        CommandError::BadArgs(format!(
            "invalid member id \"{token}\": expected a base-16 unsigned 64-bit integer"
        ))
    };

    // from_str_radix tolerates a leading '+'
    if token.starts_with(['+', '-']) {
        return Err(invalid());
    }
    u64::from_str_radix(token, 16).map_err(|_| invalid())
}

/// Resolves an alarm type token, exactly.
///
/// # Errors
///
/// Returns [`CommandError::BadArgs`] listing every valid type if the token is
/// unknown.
pub fn parse_alarm_type(token: &str) -> Result<AlarmType, CommandError> {
    AlarmType::from_token(token).ok_or_else(|| {
        debug!(token, "unknown alarm type");
        CommandError::BadArgs(format!(
            "unknown alarm type \"{token}\"; valid alarm types: {}",
            AlarmType::valid_tokens()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alarm_proto::ResponseHeader;
    use proptest::prelude::*;
    use test_case::test_case;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::cli::Format;
    use crate::client::ClientError;
    use crate::context::RequestContext;
    use crate::exitcode;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Arm(AlarmMember),
        Disarm(AlarmMember),
        List,
    }

    /// Records every call and the token of the context it was handed.
    #[derive(Default)]
    struct FakeAlarmClient {
        calls: Vec<Call>,
        tokens: Vec<CancellationToken>,
        fail_with: Option<fn() -> ClientError>,
        response: AlarmResponse,
    }

    impl FakeAlarmClient {
        fn responding(response: AlarmResponse) -> Self {
            Self {
                response,
                ..Self::default()
            }
        }

        fn failing(fail_with: fn() -> ClientError) -> Self {
            Self {
                fail_with: Some(fail_with),
                ..Self::default()
            }
        }

        fn record(&mut self, ctx: &RequestContext, call: Call) -> Result<AlarmResponse, ClientError> {
            assert!(!ctx.token().is_cancelled(), "context released before the call");
            self.calls.push(call);
            self.tokens.push(ctx.token().clone());
            match self.fail_with {
                Some(make_error) => Err(make_error()),
                None => Ok(self.response.clone()),
            }
        }
    }

    impl AlarmClient for FakeAlarmClient {
        async fn arm_alarm(
            &mut self,
            ctx: &RequestContext,
            member: AlarmMember,
        ) -> Result<AlarmResponse, ClientError> {
            self.record(ctx, Call::Arm(member))
        }

        async fn disarm_alarm(
            &mut self,
            ctx: &RequestContext,
            member: AlarmMember,
        ) -> Result<AlarmResponse, ClientError> {
            self.record(ctx, Call::Disarm(member))
        }

        async fn list_alarms(&mut self, ctx: &RequestContext) -> Result<AlarmResponse, ClientError> {
            self.record(ctx, Call::List)
        }
    }

    fn contexts() -> ContextSource {
        ContextSource::new(CancellationToken::new(), Duration::from_secs(5))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn nospace_response() -> AlarmResponse {
        AlarmResponse::new(
            ResponseHeader::default(),
            vec![AlarmMember::new(1, AlarmType::NoSpace)],
        )
    }

    async fn run(
        client: &mut FakeAlarmClient,
        command: AlarmCommands,
    ) -> (Result<(), CommandError>, String) {
        let contexts = contexts();
        let format = OutputFormat::new(Format::Simple);
        let mut out = Vec::new();
        let result = AlarmCommand::new(client, &contexts)
            .execute(&mut out, &format, &command)
            .await;
        (result, String::from_utf8(out).expect("valid utf8"))
    }

    #[tokio::test]
    async fn arm_issues_call_and_renders() {
        let mut client = FakeAlarmClient::responding(nospace_response());
        let (result, output) = run(
            &mut client,
            AlarmCommands::Arm {
                args: args(&["1", "NOSPACE"]),
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(client.calls, vec![Call::Arm(AlarmMember::new(1, AlarmType::NoSpace))]);
        assert_eq!(output, "memberID:1 alarm:NOSPACE\n");
    }

    #[tokio::test]
    async fn arm_parses_member_id_as_hex() {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(
            &mut client,
            AlarmCommands::Arm {
                args: args(&["8e9e05c52164694d", "CORRUPT"]),
            },
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(
            client.calls,
            vec![Call::Arm(AlarmMember::new(0x8e9e_05c5_2164_694d, AlarmType::Corrupt))]
        );
    }

    #[tokio::test]
    async fn arm_unknown_type_makes_no_call() {
        let mut client = FakeAlarmClient::default();
        let (result, output) = run(
            &mut client,
            AlarmCommands::Arm {
                args: args(&["1", "BOGUS"]),
            },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), exitcode::BAD_ARGS);
        assert!(err.to_string().contains("valid alarm types: NONE, NOSPACE, CORRUPT"));
        assert!(client.calls.is_empty());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn arm_bad_member_id_makes_no_call() {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(
            &mut client,
            AlarmCommands::Arm {
                args: args(&["xyz", "NOSPACE"]),
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_bad_args());
        assert!(err.to_string().contains("invalid member id \"xyz\""));
        assert!(client.calls.is_empty());
    }

    #[test_case(&[] ; "no args")]
    #[test_case(&["1"] ; "one arg")]
    #[test_case(&["1", "NOSPACE", "extra"] ; "three args")]
    #[tokio::test]
    async fn arm_wrong_arity_makes_no_call(values: &[&str]) {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(&mut client, AlarmCommands::Arm { args: args(values) }).await;

        let err = result.unwrap_err();
        assert!(err.is_bad_args());
        assert_eq!(
            err.to_string(),
            "alarm arm requires two arguments: member id and alarm type"
        );
        assert!(client.calls.is_empty());
    }

    #[tokio::test]
    async fn disarm_sends_default_member() {
        let mut client = FakeAlarmClient::responding(nospace_response());
        let (result, output) = run(&mut client, AlarmCommands::Disarm { args: vec![] }).await;

        assert!(result.is_ok());
        assert_eq!(client.calls, vec![Call::Disarm(AlarmMember::default())]);
        assert_eq!(output, "memberID:1 alarm:NOSPACE\n");
    }

    #[tokio::test]
    async fn disarm_rejects_args() {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(
            &mut client,
            AlarmCommands::Disarm {
                args: args(&["extra-arg"]),
            },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), exitcode::BAD_ARGS);
        assert_eq!(err.to_string(), "alarm disarm command accepts no arguments");
        assert!(client.calls.is_empty());
    }

    #[tokio::test]
    async fn list_issues_call() {
        let mut client = FakeAlarmClient::default();
        let (result, output) = run(&mut client, AlarmCommands::List { args: vec![] }).await;

        assert!(result.is_ok());
        assert_eq!(client.calls, vec![Call::List]);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn list_rejects_args() {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(
            &mut client,
            AlarmCommands::List {
                args: args(&["a", "b"]),
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_bad_args());
        assert_eq!(err.to_string(), "alarm list command accepts no arguments");
        assert!(client.calls.is_empty());
    }

    #[tokio::test]
    async fn client_error_is_operation_error() {
        let mut client =
            FakeAlarmClient::failing(|| ClientError::DeadlineExceeded(Duration::from_secs(5)));
        let (result, output) = run(&mut client, AlarmCommands::List { args: vec![] }).await;

        let err = result.unwrap_err();
        assert!(matches!(err, CommandError::Operation(ClientError::DeadlineExceeded(_))));
        assert_eq!(err.exit_code(), exitcode::ERROR);
        assert_eq!(client.calls, vec![Call::List]);
        assert!(output.is_empty());
    }

    #[test_case(AlarmCommands::Arm { args: vec!["1".into(), "NOSPACE".into()] } ; "arm")]
    #[test_case(AlarmCommands::Disarm { args: vec![] } ; "disarm")]
    #[test_case(AlarmCommands::List { args: vec![] } ; "list")]
    #[tokio::test]
    async fn context_released_after_success(command: AlarmCommands) {
        let mut client = FakeAlarmClient::default();
        let (result, _) = run(&mut client, command).await;

        assert!(result.is_ok());
        assert_eq!(client.tokens.len(), 1);
        assert!(client.tokens[0].is_cancelled());
    }

    #[test_case(AlarmCommands::Arm { args: vec!["1".into(), "NOSPACE".into()] } ; "arm")]
    #[test_case(AlarmCommands::Disarm { args: vec![] } ; "disarm")]
    #[test_case(AlarmCommands::List { args: vec![] } ; "list")]
    #[tokio::test]
    async fn context_released_after_error(command: AlarmCommands) {
        let mut client = FakeAlarmClient::failing(|| ClientError::Connection("refused".into()));
        let (result, _) = run(&mut client, command).await;

        assert!(result.is_err());
        assert_eq!(client.tokens.len(), 1);
        assert!(client.tokens[0].is_cancelled());
    }

    #[tokio::test]
    async fn each_call_gets_a_fresh_context() {
        let contexts = contexts();
        let format = OutputFormat::new(Format::Json);
        let mut client = FakeAlarmClient::default();
        let mut out = Vec::new();

        let mut command = AlarmCommand::new(&mut client, &contexts);
        command.list(&mut out, &format, &[]).await.expect("list");
        command.disarm(&mut out, &format, &[]).await.expect("disarm");

        assert_eq!(client.tokens.len(), 2);
        assert!(client.tokens.iter().all(CancellationToken::is_cancelled));
        assert!(!contexts.root().is_cancelled());
    }

    #[test_case("0", 0 ; "zero")]
    #[test_case("1", 1 ; "one")]
    #[test_case("ff", 255 ; "lowercase hex")]
    #[test_case("FF", 255 ; "uppercase hex")]
    #[test_case("ffffffffffffffff", u64::MAX ; "max")]
    fn member_id_valid(token: &str, expected: u64) {
        assert_eq!(parse_member_id(token).ok(), Some(expected));
    }

    #[test_case("" ; "empty")]
    #[test_case("0x1" ; "prefixed")]
    #[test_case("+1" ; "plus sign")]
    #[test_case("-1" ; "minus sign")]
    #[test_case("1g" ; "trailing garbage")]
    #[test_case("10000000000000000" ; "overflow")]
    #[test_case(" 1" ; "leading space")]
    fn member_id_invalid(token: &str) {
        let err = parse_member_id(token).unwrap_err();
        assert!(err.is_bad_args());
    }

    #[test]
    fn alarm_type_lookup_is_exact() {
        assert_eq!(parse_alarm_type("NOSPACE").ok(), Some(AlarmType::NoSpace));
        assert!(parse_alarm_type("nospace").is_err());
        assert!(parse_alarm_type("NOSPACE ").is_err());
    }

    proptest! {
        #[test]
        fn prop_member_id_round_trips_through_hex(id in any::<u64>()) {
            prop_assert_eq!(parse_member_id(&format!("{id:x}")).ok(), Some(id));
            prop_assert_eq!(parse_member_id(&format!("{id:X}")).ok(), Some(id));
        }

        #[test]
        fn prop_arm_accepts_every_known_type(id in any::<u64>(), index in 0usize..AlarmType::ALL.len()) {
            let kind = AlarmType::ALL[index];
            let member = validate_arm(&[format!("{id:x}"), kind.as_str().to_string()]).unwrap();
            prop_assert_eq!(member, AlarmMember::new(id, kind));
            prop_assert_eq!(AlarmType::try_from(member.alarm.code()).unwrap(), kind);
        }
    }
}
