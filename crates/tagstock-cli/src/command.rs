//! Simulator command line.

use anyhow::{Context, Result, anyhow, bail};
use tagstock_core::{BoxData, Key, ProductId, TagPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press and release one key.
    Key(Key),
    /// Put a tag in the reader field.
    Tag(TagPayload),
    /// Take the tag out of the field.
    Remove,
    /// Print the ledger.
    Dump,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  key <k>                                 press 0-9, A-D, * or #
  tag admin | tag clerk                   present a staff tag
  tag user <id> <amount> <purchase> <sale> present a box tag
  remove                                  take the tag away
  dump                                    print the inventory
  quit";

impl Command {
    /// Parse one input line. Blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("key" | "k", [legend]) => Command::Key(parse_key(legend)?),
            ("tag" | "t", [role, rest @ ..]) => Command::Tag(parse_tag(role, rest)?),
            ("remove" | "r", []) => Command::Remove,
            ("dump" | "d", []) => Command::Dump,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            _ => bail!("unknown command '{}', try 'help'", line.trim()),
        };
        Ok(Some(command))
    }
}

fn parse_key(legend: &str) -> Result<Key> {
    let mut chars = legend.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Key::from_char(c).ok_or_else(|| anyhow!("no key labelled '{c}'")),
        _ => bail!("a key is a single character, got '{legend}'"),
    }
}

fn parse_tag(role: &str, args: &[&str]) -> Result<TagPayload> {
    match (role.to_ascii_lowercase().as_str(), args) {
        ("admin", []) => Ok(TagPayload::Admin),
        ("clerk", []) => Ok(TagPayload::Clerk),
        ("user", [id, amount, purchase, sale]) => {
            let id: u8 = id.parse().context("product id")?;
            Ok(TagPayload::User(BoxData {
                product: ProductId::new(id)?,
                amount: amount.parse().context("amount")?,
                purchase_value: purchase.parse().context("purchase value")?,
                sale_value: sale.parse().context("sale value")?,
            }))
        }
        ("user", _) => bail!("usage: tag user <id> <amount> <purchase> <sale>"),
        _ => bail!("unknown tag role '{role}'"),
    }
}
