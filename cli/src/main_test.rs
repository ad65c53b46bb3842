use super::*;

#[test]
fn parses_nested_holiday_commands() {
    let cli = Cli::try_parse_from([
        "tripsnatch",
        "holidays",
        "track",
        "https://www.example-travel.test/holiday/42",
        "--target",
        "499.5",
    ])
    .unwrap();
    match cli.command {
        Command::Holidays(HolidaysCommand {
            command: HolidaysSubcommand::Track { url, target, current },
        }) => {
            assert_eq!(url, "https://www.example-travel.test/holiday/42");
            assert!((target - 499.5).abs() < f64::EPSILON);
            assert_eq!(current, None);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn api_url_flag_is_optional() {
    let cli = Cli::try_parse_from(["tripsnatch", "--api-url", "http://api.test", "whoami"]).unwrap();
    assert_eq!(cli.api_url.as_deref(), Some("http://api.test"));
    assert!(matches!(cli.command, Command::Whoami));
}

#[test]
fn unverified_error_suggests_resend() {
    let err = CliError::Session(SessionError::Unverified {
        email: Some("pending@example.com".into()),
        user_id: Some(2),
    });
    assert_eq!(err.hint().as_deref(), Some("check your inbox, or run `tripsnatch resend pending@example.com`"));
}

#[test]
fn wrong_password_has_no_hint() {
    let err = CliError::Session(SessionError::AuthFailed {
        status: 401,
        message: Some("Incorrect email or password".into()),
    });
    assert_eq!(err.hint(), None);
    assert_eq!(err.to_string(), "request rejected with status 401: Incorrect email or password");
}
