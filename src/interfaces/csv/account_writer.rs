use crate::domain::account::UserAccount;
use crate::error::Result;
use std::io::Write;

/// Writes the final user balances as CSV.
///
/// Wraps `csv::Writer` around any `Write` sink (e.g., stdout). Rows are
/// sorted by user id so repeated runs produce identical output.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_accounts(&mut self, mut accounts: Vec<UserAccount>) -> Result<()> {
        accounts.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        self.writer.write_record(["user", "username", "coins"])?;
        for account in accounts {
            self.writer.write_record([
                account.id.as_str(),
                &account.display_name,
                &account.coin_balance.to_string(),
            ])?;
        }
        self.writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::CoinBalance;

    #[test]
    fn test_writer_sorted_output() {
        let accounts = vec![
            UserAccount::new("u2", "bob").with_balance(CoinBalance::new(5)),
            UserAccount::new("u1", "alice").with_balance(CoinBalance::new(120)),
        ];

        let mut writer = AccountWriter::new(Vec::new());
        writer.write_accounts(accounts).unwrap();
        let output = String::from_utf8(writer.writer.into_inner().unwrap()).unwrap();

        assert_eq!(output, "user,username,coins\nu1,alice,120\nu2,bob,5\n");
    }

    #[test]
    fn test_writer_empty() {
        let mut writer = AccountWriter::new(Vec::new());
        writer.write_accounts(Vec::new()).unwrap();
        let output = String::from_utf8(writer.writer.into_inner().unwrap()).unwrap();

        assert_eq!(output, "user,username,coins\n");
    }
}
