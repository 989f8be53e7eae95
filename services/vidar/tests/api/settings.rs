use shillzzz_gungnir::RankingBasis;
use vidar::settings::Settings;

#[test]
fn base_settings_load() {
    let settings = Settings::load().expect("failed to load settings");
    assert_eq!(settings.pot.take_rate_percent, 40);
    assert_eq!(settings.pot.ranking, RankingBasis::AllTimeShills);
    assert_eq!(settings.price.ttl_secs, 60);
    assert_eq!(settings.price.timeout_secs, 5);
    assert!(settings.database.pool_size > 0);
    assert!(!settings.payments.rpc_url.is_empty());
}
