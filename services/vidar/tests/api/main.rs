mod ads;
mod boosters;
mod cron;
mod pot;
mod settings;
mod testapp;
