use {
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

/// Identifier of an account, assigned by the store unless the caller picks one.
pub type AccountId = i64;

/// Account is very simplified, since we don't really care about user data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[serde(rename = "accountHolderName", alias = "holderName")]
    pub holder_name: String,
    pub balance: Decimal,
}

/// Everything needed to open an account. `id` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(default)]
    pub id: Option<AccountId>,
    #[serde(rename = "accountHolderName", alias = "holderName")]
    pub holder_name: String,
    pub balance: Decimal,
}

impl NewAccount {
    pub fn new(holder_name: impl Into<String>, balance: Decimal) -> Self {
        NewAccount {
            id: None,
            holder_name: holder_name.into(),
            balance,
        }
    }

    pub fn with_id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    /// Materializes the record once the store has picked an id.
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            holder_name: self.holder_name,
            balance: self.balance,
        }
    }
}
