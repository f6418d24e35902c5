pub mod allocation;
pub mod balance;
pub mod expense;
pub mod member;
pub mod money;
pub mod settlement;

pub use allocation::{Allocation, Share};
pub use balance::{BalanceMap, LedgerSummary, MemberPosition};
pub use expense::{
    ExactShare, Expense, ExpenseCategory, ExpenseDraft, ExpenseUpdate, PercentShare, Split, SplitPolicy,
};
pub use member::{member_ids, Group, Member, MemberId};
pub use money::{Money, MINOR_UNIT_SCALE};
pub use settlement::{Settlement, SettlementPlan};
