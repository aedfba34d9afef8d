//! Interactive console commands read from stdin.

use std::str::FromStr;

use seqroll_types::{Digest, SequencerError, TxHash, parse_digest, parse_tx_hash};

pub const USAGE: &str = "\
commands:
  get <digest>      print the stored batch for a digest
  fraud <txHash>    apply a fraud proof for a transaction
  status            store and buffer summary
  help              this message
  exit              shut down";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get(Digest),
    Fraud(TxHash),
    Status,
    Help,
    Exit,
}

impl FromStr for Command {
    type Err = SequencerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(SequencerError::InvalidCommand {
                reason: "empty input".to_string(),
            });
        };
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(SequencerError::InvalidCommand {
                reason: format!("too many arguments for {verb:?}"),
            });
        }

        let missing = |what: &str| SequencerError::InvalidCommand {
            reason: format!("{verb} needs a {what}"),
        };
        match (verb.to_ascii_lowercase().as_str(), arg) {
            ("get", Some(digest)) => Ok(Self::Get(parse_digest(digest)?)),
            ("get", None) => Err(missing("digest")),
            ("fraud", Some(hash)) => Ok(Self::Fraud(parse_tx_hash(hash)?)),
            ("fraud", None) => Err(missing("transaction hash")),
            ("status", None) => Ok(Self::Status),
            ("help", None) => Ok(Self::Help),
            ("exit" | "quit", None) => Ok(Self::Exit),
            _ => Err(SequencerError::InvalidCommand {
                reason: format!("unknown command {line:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_get_and_fraud() {
        let digest = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            format!("get {digest}").parse::<Command>().unwrap(),
            Command::Get(Digest([0xAB; 32]))
        );
        let hash = format!("0X{}", "CD".repeat(32));
        assert_eq!(
            format!("  fraud   {hash} ").parse::<Command>().unwrap(),
            Command::Fraud(TxHash([0xCD; 32]))
        );
    }

    #[test]
    fn parses_bare_words() {
        assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
        assert_eq!("HELP".parse::<Command>().unwrap(), Command::Help);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Exit);
    }

    #[test]
    fn rejects_bad_input() {
        for line in ["", "get", "fraud 0x12", "status now", "launch"] {
            let err = line.parse::<Command>().unwrap_err();
            assert!(
                matches!(
                    err,
                    SequencerError::InvalidCommand { .. } | SequencerError::InvalidLength { .. }
                ),
                "{line:?} gave {err}"
            );
        }
    }
}
