pub mod transform_contract;
