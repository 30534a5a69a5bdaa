pub mod config;
pub mod elo;
pub mod export;
pub mod features;
pub mod identity;
pub mod indices;
pub mod lineups;
pub mod market_values;
pub mod match_record;
pub mod normalize;
pub mod pipeline;
pub mod rolling_form;
pub mod table;
pub mod team_value;
