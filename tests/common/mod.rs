#![allow(dead_code)]

use std::io::Write;

use chrono::NaiveDate;
use player_api::db::SqliteStore;
use player_api::models::Player;

pub const HEADER: &str = "playerID,birthYear,birthMonth,birthDay,birthCountry,birthState,birthCity,deathYear,deathMonth,deathDay,deathCountry,deathState,deathCity,nameFirst,nameLast,nameGiven,weight,height,bats,throws,debut,finalGame,retroID,bbrefID";

pub const AARON: &str = "aaronha01,1934,2,5,USA,AL,Mobile,2021,1,22,USA,GA,Atlanta,Hank,Aaron,Henry Louis,180,72,R,R,1954-04-13,1976-10-03,aaroh101,aaronha01";
pub const AARDSMA: &str = "aardsda01,1981,12,27,USA,CO,Denver,,,,,,,David,Aardsma,David Allan,215,75,R,R,2004-04-06,2015-08-23,aardd001,aardsda01";
pub const ABBOTT: &str = "abbotji01,1967,9,19,USA,MI,Flint,,,,,,,Jim,Abbott,James Anthony,200,75,L,L,1989-04-08,1999-07-21,abboj001,abbotji01";

pub async fn store() -> SqliteStore {
    let store = SqliteStore::connect_in_memory().await.expect("in-memory store");
    store.ensure_schema().await.expect("schema");
    store
}

/// Write a CSV snapshot (header plus `lines`) to a fresh temp file.
pub fn snapshot(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    rewrite(&mut file, lines);
    file
}

pub fn rewrite(file: &mut tempfile::NamedTempFile, lines: &[&str]) {
    let mut body = String::from(HEADER);
    body.push('\n');
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    std::fs::write(file.path(), body).expect("write snapshot");
    file.flush().expect("flush");
}

/// Synthetic player with every column populated.
pub fn player(id: &str) -> Player {
    Player {
        player_id: id.to_string(),
        birth_year: 1950,
        birth_month: 6,
        birth_day: 15,
        birth_country: "USA".to_string(),
        birth_state: "NY".to_string(),
        birth_city: "Brooklyn".to_string(),
        death_year: 2010,
        death_month: 0,
        death_day: 3,
        death_country: "USA".to_string(),
        death_state: "FL".to_string(),
        death_city: "Miami".to_string(),
        name_first: "Test".to_string(),
        name_last: id.to_string(),
        name_given: "Test Player".to_string(),
        weight: 190,
        height: 73,
        bats: "B".to_string(),
        throws: "R".to_string(),
        debut: NaiveDate::from_ymd_opt(1970, 4, 1),
        final_game: NaiveDate::from_ymd_opt(1985, 9, 30),
        retro_id: format!("{id}-r"),
        bbref_id: format!("{id}-b"),
    }
}
