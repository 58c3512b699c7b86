use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use shopbooks_accounting::{
    Bank, BankAccount, BankDetail, BankTransaction, NewBank, NewBankAccount, NewBankDetail,
    NewBankTransaction, bank_balance,
};
use shopbooks_core::{BankAccountId, BankDetailId, BankId, BankTransactionId};

use super::BackOffice;
use crate::error::{StoreError, StoreResult};
use crate::repository::{BankRepository, Transaction};

async fn require_bank(tx: &mut dyn Transaction, id: BankId) -> StoreResult<Bank> {
    tx.bank(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("bank {id}")))
}

async fn require_account(tx: &mut dyn Transaction, id: BankAccountId) -> StoreResult<BankAccount> {
    tx.bank_account(id)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("bank account {id}")))
}

impl BackOffice {
    pub async fn create_bank(&self, new: NewBank) -> StoreResult<Bank> {
        let bank = new.into_bank(BankId::new())?;
        let mut tx = self.begin().await?;
        tx.insert_bank(&bank).await?;
        tx.commit().await?;
        Ok(bank)
    }

    pub async fn banks(&self) -> StoreResult<Vec<Bank>> {
        let mut tx = self.begin().await?;
        tx.banks().await
    }

    pub async fn add_bank_detail(&self, bank: BankId, new: NewBankDetail) -> StoreResult<BankDetail> {
        let mut tx = self.begin().await?;
        require_bank(tx.as_mut(), bank).await?;
        let detail = new.into_detail(BankDetailId::new(), bank, Utc::now().date_naive())?;
        tx.insert_bank_detail(&detail).await?;
        tx.commit().await?;
        Ok(detail)
    }

    pub async fn bank_details(&self, bank: BankId) -> StoreResult<Vec<BankDetail>> {
        let mut tx = self.begin().await?;
        require_bank(tx.as_mut(), bank).await?;
        tx.bank_details(bank).await
    }

    /// `Σ credit − Σ debit` over the bank's detail rows.
    pub async fn bank_balance(&self, bank: BankId) -> StoreResult<Decimal> {
        Ok(bank_balance(&self.bank_details(bank).await?))
    }

    pub async fn create_bank_account(&self, new: NewBankAccount) -> StoreResult<BankAccount> {
        let account = new.into_account(BankAccountId::new(), Utc::now())?;
        let mut tx = self.begin().await?;
        tx.insert_bank_account(&account).await?;
        tx.commit().await?;
        info!(account_id = %account.id, opening = %account.opening_balance, "bank account opened");
        Ok(account)
    }

    pub async fn bank_accounts(&self) -> StoreResult<Vec<BankAccount>> {
        let mut tx = self.begin().await?;
        tx.bank_accounts().await
    }

    pub async fn bank_account(&self, id: BankAccountId) -> StoreResult<BankAccount> {
        let mut tx = self.begin().await?;
        require_account(tx.as_mut(), id).await
    }

    /// Record a deposit or withdrawal and move `current_balance` by the
    /// signed amount in the same transaction. Balances may go negative.
    #[instrument(skip(self, new), err)]
    pub async fn record_bank_transaction(
        &self,
        account: BankAccountId,
        new: NewBankTransaction,
    ) -> StoreResult<(BankTransaction, Decimal)> {
        let mut tx = self.begin().await?;
        require_account(tx.as_mut(), account).await?;
        let transaction = new.into_transaction(BankTransactionId::new(), account, Utc::now())?;
        tx.insert_bank_transaction(&transaction).await?;
        let balance = tx
            .adjust_account_balance(account, transaction.signed_amount())
            .await?;
        tx.commit().await?;

        info!(
            account_id = %account,
            kind = transaction.transaction_type.as_str(),
            amount = %transaction.amount,
            balance = %balance,
            "bank transaction recorded"
        );
        Ok((transaction, balance))
    }

    /// Newest first.
    pub async fn bank_transactions(&self, account: BankAccountId) -> StoreResult<Vec<BankTransaction>> {
        let mut tx = self.begin().await?;
        require_account(tx.as_mut(), account).await?;
        tx.bank_transactions(account).await
    }

    /// Reset `current_balance` to `opening + Σ deposits − Σ withdrawals`.
    #[instrument(skip(self), err)]
    pub async fn recompute_account_balance(&self, id: BankAccountId) -> StoreResult<BankAccount> {
        let mut tx = self.begin().await?;
        let mut account = require_account(tx.as_mut(), id).await?;
        let transactions = tx.bank_transactions(id).await?;
        let balance = account.recompute_balance(&transactions);
        if balance != account.current_balance {
            warn!(
                account_id = %id,
                stored = %account.current_balance,
                recomputed = %balance,
                "account balance drifted from transactions"
            );
            tx.set_account_balance(id, balance).await?;
            tx.commit().await?;
            account.current_balance = balance;
        }
        Ok(account)
    }
}
