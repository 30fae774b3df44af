pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGSIFT CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ./logsift.yml
#   3. ~/.config/logsift/config.yml
#   4. /etc/logsift/config.yml
#
# Values may reference environment variables with $env{NAME}.

# Access log to analyze, one request per line
input: /var/log/nginx/access.log

# Reports are written here as CSV files (created if missing)
output_dir: ./dist

# Active extraction pattern: a built-in ('nginx', 'generic') or a key of
# 'patterns' below
format: nginx

# Extra patterns. A regex either names its groups (?P<name>...) or lists
# 'fields' for its positional groups. Patterns must provide ip, method and
# url; a 'time' field needs a time_format (strptime string, 'iso8601',
# 'epoch' or 'epoch_ms').
patterns:
  legacy:
    regex: '(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}).*?\[(.*?)\]\s"(GET|POST|PUT|PATCH|HEAD|DELETE) (\S+).*?"\s(\d{3})'
    fields: [ip, time, method, url, status]
    time_format: '%d/%b/%Y:%H:%M:%S %z'
    # Match only at line start
    anchored: false
    # 'generic' applies the regex as written; 'nginx' anchors it and requires
    # time and status fields
    strategy: generic

# Rows whose url matches this expression are dropped before reporting
exclude: 'admin/|li_op='

# Convert timestamps to this zone (IANA name, UTC, or offset like +02:00).
# Leave unset to keep the offset written in the log.
target_timezone: Europe/Kyiv

# Lines normalized per batch. Bounds memory use on large logs; leave unset to
# process the whole file as one batch.
chunk_size: 10000

# Malformed status/size values: 'nullify' (empty) or 'zero'
coercion: nullify

# Lines that are not valid UTF-8: 'skip' or 'abort'
on_undecodable: skip

reports:
  enabled: true
  top_pages: 20
  top_ips: 30
  top_url_ip: 30
  top_errors: 50
  unique_visitors: 50
  suspicious_bots: 20
"#
    .to_string()
}
