pub mod team_formation;
