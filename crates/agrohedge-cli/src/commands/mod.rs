pub mod outcome;
pub mod reference;
pub mod scenarios;
pub mod workbook;
