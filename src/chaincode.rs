// ⛓️ Chaincode Dispatcher
// Function name + positional args → exactly one of Writer / Reader / Reconstructor.
//
// `invoke` runs against any LedgerStub.
// `execute` is the host-side convenience: begin a TxContext on a store,
// invoke, and commit if the function writes.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::codec;
use crate::error::{LedgerError, LedgerResult};
use crate::events::LedgerEvent;
use crate::history::read_history_encoded;
use crate::ledger::{LedgerStub, TxContext, VersionStore};
use crate::reader::read_customer_aggregate;
use crate::records::RecordType;
use crate::writer::{write_collateral, write_customer, write_project};

/// Default chaincode identity used by the gateway
pub const CHAINCODE_NAME: &str = "assetscc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    AddCustomerInfo,
    AddCollateralInfo,
    AddProjectInfo,
    GetCustomerInfo,
    GetHistoryCustomerInfo,
    GetHistoryCollateralInfo,
    GetHistoryProjectInfo,
}

impl Function {
    pub const ALL: [Function; 7] = [
        Function::AddCustomerInfo,
        Function::AddCollateralInfo,
        Function::AddProjectInfo,
        Function::GetCustomerInfo,
        Function::GetHistoryCustomerInfo,
        Function::GetHistoryCollateralInfo,
        Function::GetHistoryProjectInfo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Function::AddCustomerInfo => "addCustomerInfo",
            Function::AddCollateralInfo => "addCollateralInfo",
            Function::AddProjectInfo => "addProjectInfo",
            Function::GetCustomerInfo => "getCustomerInfo",
            Function::GetHistoryCustomerInfo => "getHistoryCustomerInfo",
            Function::GetHistoryCollateralInfo => "getHistoryCollateralInfo",
            Function::GetHistoryProjectInfo => "getHistoryProjectInfo",
        }
    }

    /// Writes must be committed; everything else is a pure query
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Function::AddCustomerInfo | Function::AddCollateralInfo | Function::AddProjectInfo
        )
    }

    /// Record type whose history this function reads
    pub fn history_of(&self) -> Option<RecordType> {
        match self {
            Function::GetHistoryCustomerInfo => Some(RecordType::Customer),
            Function::GetHistoryCollateralInfo => Some(RecordType::Collateral),
            Function::GetHistoryProjectInfo => Some(RecordType::Project),
            _ => None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| LedgerError::validation(format!("received unknown function invocation: {}", s)))
    }
}

/// Single-argument queries: exactly one non-empty customer name
fn single_name(args: &[String]) -> LedgerResult<&str> {
    match args {
        [name] if !name.is_empty() => Ok(name.as_str()),
        [_] => Err(LedgerError::validation("customer name can not be empty")),
        _ => Err(LedgerError::validation(format!(
            "incorrect number of arguments: expected 1, got {}",
            args.len()
        ))),
    }
}

/// Dispatch one call. Writes return an empty payload.
pub fn invoke<L: LedgerStub + ?Sized>(
    stub: &mut L,
    function: Function,
    args: &[String],
) -> LedgerResult<Vec<u8>> {
    match function {
        Function::AddCustomerInfo => write_customer(stub, args).map(|_| Vec::new()),
        Function::AddCollateralInfo => write_collateral(stub, args).map(|_| Vec::new()),
        Function::AddProjectInfo => write_project(stub, args).map(|_| Vec::new()),
        Function::GetCustomerInfo => {
            let name = single_name(args)?;
            codec::encode_response(&read_customer_aggregate(&*stub, name)?)
        }
        Function::GetHistoryCustomerInfo => history(&*stub, args, RecordType::Customer),
        Function::GetHistoryCollateralInfo => history(&*stub, args, RecordType::Collateral),
        Function::GetHistoryProjectInfo => history(&*stub, args, RecordType::Project),
    }
}

fn history<L: LedgerStub + ?Sized>(stub: &L, args: &[String], record_type: RecordType) -> LedgerResult<Vec<u8>> {
    let name = single_name(args)?;
    read_history_encoded(stub, name, record_type)
}

/// Outcome of running one function against a store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub tx_id: String,
    #[serde(skip)]
    pub payload: Vec<u8>,
    /// Set when the transaction committed a write set
    pub event: Option<LedgerEvent>,
}

impl Response {
    /// Payload parsed as JSON (null for empty payloads)
    pub fn payload_json(&self) -> LedgerResult<serde_json::Value> {
        if self.payload.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.payload).map_err(|e| LedgerError::Decoding(e.to_string()))
    }
}

/// Begin a transaction on `store`, invoke, and commit writes
pub fn execute<S: VersionStore + ?Sized>(
    store: &S,
    function: Function,
    args: &[String],
) -> LedgerResult<Response> {
    let mut tx = TxContext::begin(store, function.name());
    let tx_id = tx.tx_id().to_string();

    let payload = match invoke(&mut tx, function, args) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(tx_id = %tx_id, function = %function, error = %err, "invocation failed");
            return Err(err);
        }
    };

    let event = if function.is_write() { tx.commit()? } else { None };

    Ok(Response {
        tx_id,
        payload,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CollateralInfo, CustomerAggregate, CustomerInfo, HistoryEntry, ProjectInfo};
    use crate::store::{MemoryStore, SqliteStore};
    use crate::writer::tests::{args, customer_args, project_args, varied_customer_args};

    #[test]
    fn test_function_names_roundtrip() {
        for f in Function::ALL {
            assert_eq!(f.name().parse::<Function>().unwrap(), f);
        }
        assert!(matches!("deleteCustomer".parse::<Function>(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_write_functions() {
        let writes: Vec<Function> = Function::ALL.into_iter().filter(|f| f.is_write()).collect();
        assert_eq!(
            writes,
            vec![Function::AddCustomerInfo, Function::AddCollateralInfo, Function::AddProjectInfo]
        );
        assert_eq!(Function::GetHistoryCollateralInfo.history_of(), Some(RecordType::Collateral));
        assert_eq!(Function::GetCustomerInfo.history_of(), None);
    }

    #[test]
    fn test_query_argument_validation() {
        let store = MemoryStore::new();
        for f in [Function::GetCustomerInfo, Function::GetHistoryProjectInfo] {
            assert!(matches!(execute(&store, f, &[]), Err(LedgerError::Validation(_))));
            assert!(matches!(execute(&store, f, &args(&[""])), Err(LedgerError::Validation(_))));
            assert!(matches!(
                execute(&store, f, &args(&["Acme", "extra"])),
                Err(LedgerError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_writes_commit_queries_do_not() {
        let store = MemoryStore::new();
        let write = execute(&store, Function::AddCustomerInfo, &customer_args("Acme")).unwrap();
        assert!(write.payload.is_empty());
        assert_eq!(write.event.as_ref().unwrap().tx_id, write.tx_id);

        let read = execute(&store, Function::GetCustomerInfo, &args(&["Acme"])).unwrap();
        assert!(read.event.is_none());
        assert_eq!(store.info().unwrap().height, 1);
    }

    #[test]
    fn test_failed_write_commits_nothing() {
        let store = MemoryStore::new();
        let err = execute(&store, Function::AddProjectInfo, &project_args("Ghost")).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
        assert_eq!(store.info().unwrap().height, 0);
        assert!(store.events_after(0, None, 10).unwrap().is_empty());
    }

    /// End-to-end: customer, two collateral writes, aggregate + history
    fn acme_scenario<S: VersionStore>(store: &S) {
        let fields = customer_args("Acme");
        execute(store, Function::AddCustomerInfo, &fields).unwrap();

        let aggregate: CustomerAggregate = serde_json::from_slice(
            &execute(store, Function::GetCustomerInfo, &args(&["Acme"])).unwrap().payload,
        )
        .unwrap();
        assert_eq!(aggregate.customer_info, CustomerInfo::from_fields(&fields[1..]));
        assert!(aggregate.collateral_info.is_empty());
        assert_eq!(aggregate.project_info, ProjectInfo::default());

        execute(store, Function::AddCollateralInfo, &args(&["Acme", "C1", "Land", "C2", "Building"])).unwrap();
        let aggregate: CustomerAggregate = serde_json::from_slice(
            &execute(store, Function::GetCustomerInfo, &args(&["Acme"])).unwrap().payload,
        )
        .unwrap();
        assert_eq!(aggregate.collateral_info.len(), 2);

        execute(store, Function::AddCollateralInfo, &args(&["Acme", "C3", "Equipment"])).unwrap();
        let aggregate: CustomerAggregate = serde_json::from_slice(
            &execute(store, Function::GetCustomerInfo, &args(&["Acme"])).unwrap().payload,
        )
        .unwrap();
        assert_eq!(aggregate.collateral_info, vec![CollateralInfo::new("C3", "Equipment")]);

        let history: Vec<HistoryEntry<Vec<CollateralInfo>>> = serde_json::from_slice(
            &execute(store, Function::GetHistoryCollateralInfo, &args(&["Acme"])).unwrap().payload,
        )
        .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, vec![CollateralInfo::new("C3", "Equipment")]);
        assert_eq!(
            history[1].value,
            vec![CollateralInfo::new("C1", "Land"), CollateralInfo::new("C2", "Building")]
        );
        assert_ne!(history[0].transaction_id, history[1].transaction_id);

        let project_history = execute(store, Function::GetHistoryProjectInfo, &args(&["Acme"])).unwrap();
        assert_eq!(project_history.payload_json().unwrap(), serde_json::json!([]));
    }

    fn varied_customers_round_trip<S: VersionStore>(store: &S) {
        for fields in varied_customer_args() {
            execute(store, Function::AddCustomerInfo, &fields).unwrap();

            let aggregate: CustomerAggregate = serde_json::from_slice(
                &execute(store, Function::GetCustomerInfo, &fields[..1]).unwrap().payload,
            )
            .unwrap();
            assert_eq!(aggregate.customer_info, CustomerInfo::from_fields(&fields[1..]));

            let history: Vec<HistoryEntry<CustomerInfo>> = serde_json::from_slice(
                &execute(store, Function::GetHistoryCustomerInfo, &fields[..1]).unwrap().payload,
            )
            .unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].value.to_fields(), fields[1..].to_vec());
        }
    }

    #[test]
    fn test_varied_customers_memory() {
        varied_customers_round_trip(&MemoryStore::new());
    }

    #[test]
    fn test_varied_customers_sqlite() {
        varied_customers_round_trip(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_acme_scenario_memory() {
        acme_scenario(&MemoryStore::new());
    }

    #[test]
    fn test_acme_scenario_sqlite() {
        acme_scenario(&SqliteStore::open_in_memory().unwrap());
    }
}
